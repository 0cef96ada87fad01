//! WAV file reading and writing.
//!
//! Program audio comes in as stereo at any rate; rendered composite goes
//! out as mono IEEE float at the processing rate so over-deviation peaks
//! survive unclipped.

use crate::{Error, Result};
use hound::{SampleFormat, WavReader, WavWriter};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// WAV audio encoding format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavFormat {
    /// Linear PCM (integer samples).
    Pcm,
    /// IEEE 754 floating-point samples.
    IeeeFloat,
}

/// WAV file metadata extracted without loading sample data.
#[derive(Debug, Clone)]
pub struct WavInfo {
    /// Number of audio channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample.
    pub bits_per_sample: u16,
    /// Samples per channel.
    pub num_frames: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Audio encoding format.
    pub format: WavFormat,
}

/// Read WAV metadata without loading sample data.
pub fn read_wav_info<P: AsRef<Path>>(path: P) -> Result<WavInfo> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let num_frames = u64::from(reader.duration());

    let format = match spec.sample_format {
        SampleFormat::Float => WavFormat::IeeeFloat,
        SampleFormat::Int => WavFormat::Pcm,
    };

    Ok(WavInfo {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        num_frames,
        duration_secs: num_frames as f64 / f64::from(spec.sample_rate),
        format,
    })
}

/// Left and right channels of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StereoSamples {
    /// Left channel.
    pub left: Vec<f32>,
    /// Right channel.
    pub right: Vec<f32>,
}

impl StereoSamples {
    /// Pair two channels, truncating the longer one.
    pub fn new(mut left: Vec<f32>, mut right: Vec<f32>) -> Self {
        let len = left.len().min(right.len());
        left.truncate(len);
        right.truncate(len);
        Self { left, right }
    }

    /// Duplicate a mono signal to both channels.
    pub fn from_mono(mono: Vec<f32>) -> Self {
        Self {
            right: mono.clone(),
            left: mono,
        }
    }

    /// Frames per channel.
    pub fn len(&self) -> usize {
        self.left.len()
    }

    /// True when there are no frames.
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }
}

/// Interleaved samples of every channel, scaled to [-1, 1).
fn read_samples(reader: WavReader<BufReader<File>>) -> Result<Vec<f32>> {
    let spec = reader.spec();
    let samples = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };
    Ok(samples)
}

/// Read program audio as stereo along with its sample rate.
///
/// Mono files are duplicated to both channels; files with more than two
/// channels use the first two.
pub fn read_wav_stereo<P: AsRef<Path>>(path: P) -> Result<(StereoSamples, u32)> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels);
    if channels == 0 {
        return Err(Error::UnsupportedFormat("WAV file has no channels".into()));
    }
    let all = read_samples(reader)?;

    let stereo = if channels == 1 {
        StereoSamples::from_mono(all)
    } else {
        let frames = all.len() / channels;
        let mut left = Vec::with_capacity(frames);
        let mut right = Vec::with_capacity(frames);
        for frame in all.chunks_exact(channels) {
            left.push(frame[0]);
            right.push(frame[1]);
        }
        StereoSamples::new(left, right)
    };

    Ok((stereo, spec.sample_rate))
}

/// Write stereo audio at `bits_per_sample` (32 writes float, anything else
/// integer PCM).
pub fn write_wav_stereo<P: AsRef<Path>>(
    path: P,
    samples: &StereoSamples,
    sample_rate: u32,
    bits_per_sample: u16,
) -> Result<()> {
    let float = bits_per_sample == 32;
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample,
        sample_format: if float {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    };
    let mut writer = WavWriter::create(path, spec)?;

    if float {
        for (&l, &r) in samples.left.iter().zip(&samples.right) {
            writer.write_sample(l)?;
            writer.write_sample(r)?;
        }
    } else {
        let max_val = (1i64 << (bits_per_sample - 1)) as f32;
        for (&l, &r) in samples.left.iter().zip(&samples.right) {
            writer.write_sample((l * max_val).clamp(-max_val, max_val - 1.0) as i32)?;
            writer.write_sample((r * max_val).clamp(-max_val, max_val - 1.0) as i32)?;
        }
    }

    writer.finalize()?;
    Ok(())
}

/// Write a composite signal as a mono 32-bit float WAV.
pub fn write_composite_wav<P: AsRef<Path>>(
    path: P,
    composite: &[f32],
    sample_rate: u32,
) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for &s in composite {
        writer.write_sample(s)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Read a composite recording along with its sample rate.
///
/// Multi-channel files use the first channel.
pub fn read_composite_wav<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, u32)> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels);
    if channels == 0 {
        return Err(Error::UnsupportedFormat("WAV file has no channels".into()));
    }
    let all = read_samples(reader)?;
    let composite = if channels == 1 {
        all
    } else {
        all.chunks_exact(channels).map(|frame| frame[0]).collect()
    };
    Ok((composite, spec.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn composite_keeps_peaks_above_full_scale() {
        let composite: Vec<f32> = (0..1000).map(|i| 1.5 * (i as f32 / 50.0).sin()).collect();
        let file = NamedTempFile::new().unwrap();
        write_composite_wav(file.path(), &composite, 192_000).unwrap();

        let (loaded, rate) = read_composite_wav(file.path()).unwrap();
        assert_eq!(rate, 192_000);
        assert_eq!(loaded, composite);

        let info = read_wav_info(file.path()).unwrap();
        assert_eq!(info.channels, 1);
        assert_eq!(info.format, WavFormat::IeeeFloat);
        assert_eq!(info.num_frames, 1000);
    }

    #[test]
    fn stereo_roundtrip_i16() {
        let left: Vec<f32> = (0..500).map(|i| (i as f32 / 100.0).sin() * 0.9).collect();
        let right: Vec<f32> = left.iter().map(|s| -s).collect();
        let samples = StereoSamples::new(left.clone(), right.clone());

        let file = NamedTempFile::new().unwrap();
        write_wav_stereo(file.path(), &samples, 44_100, 16).unwrap();

        let (loaded, rate) = read_wav_stereo(file.path()).unwrap();
        assert_eq!(rate, 44_100);
        assert_eq!(loaded.len(), 500);
        for (a, b) in left.iter().zip(&loaded.left) {
            assert!((a - b).abs() < 0.001);
        }
        for (a, b) in right.iter().zip(&loaded.right) {
            assert!((a - b).abs() < 0.001);
        }
    }

    #[test]
    fn mono_file_reads_as_stereo() {
        let mono: Vec<f32> = (0..100).map(|i| i as f32 / 100.0).collect();
        let file = NamedTempFile::new().unwrap();
        write_composite_wav(file.path(), &mono, 48_000).unwrap();

        let (stereo, _) = read_wav_stereo(file.path()).unwrap();
        assert_eq!(stereo.left, mono);
        assert_eq!(stereo.right, mono);
    }

    #[test]
    fn new_truncates_to_shorter_channel() {
        let s = StereoSamples::new(vec![1.0, 2.0, 3.0], vec![4.0]);
        assert_eq!(s.len(), 1);
        assert!(!s.is_empty());
    }
}
