//! Streaming rational upsampler.
//!
//! Converts a block stream from `from` Hz to `to` Hz (`to ≥ from`) with a
//! polyphase windowed-sinc filter. The ratio `L/M = to/from` is reduced by
//! the gcd, so 48 kHz → 192 kHz runs as 4/1 and 44.1 kHz → 192 kHz as
//! 640/147.
//!
//! # Theory
//!
//! Conceptually the input is zero-stuffed by `L`, low-passed at the input
//! Nyquist frequency and decimated by `M`. The polyphase form skips the
//! zeros and the discarded samples: for each output the filter phase
//! `offset ∈ [0, L)` selects every `L`-th tap, starting at `offset`:
//!
//! ```text
//! y = Σk h[offset + k·L] · x[n − k]
//! ```
//!
//! after which `offset += M`. Each new input sample subtracts `L`.
//!
//! The prototype is a Blackman-windowed sinc of `L · TAPS_PER_PHASE` taps
//! with its cutoff at 90% of the input Nyquist frequency, scaled by `L` to
//! restore the level lost to zero-stuffing.
//!
//! Reference: R. E. Crochiere and L. R. Rabiner, *Multirate Digital Signal
//! Processing*, Prentice Hall, 1983, Chapter 3.

use crate::{DesignError, blackman, dot, gcd, sinc};
use alloc::vec;
use alloc::vec::Vec;

/// Input samples each output sample is computed from.
pub const TAPS_PER_PHASE: usize = 32;

/// Upper bound on the prototype filter length.
pub const MAX_FILTER_LEN: usize = 65_536;

/// Streaming polyphase rational upsampler.
#[derive(Debug, Clone)]
pub struct Resampler {
    from: u32,
    to: u32,
    up: usize,
    down: usize,
    /// `coeffs[p * TAPS_PER_PHASE + k] = h[p + k·up]`
    coeffs: Vec<f32>,
    /// Doubled ring, newest first from `pos`.
    history: Vec<f32>,
    pos: usize,
    offset: usize,
}

impl Resampler {
    /// Build a resampler from `from` Hz to `to` Hz.
    pub fn new(from: u32, to: u32) -> Result<Self, DesignError> {
        if from == 0 || to == 0 {
            return Err(DesignError::ZeroSampleRate);
        }
        if to < from {
            return Err(DesignError::Downsampling { from, to });
        }

        let g = gcd(u64::from(from), u64::from(to));
        let up = (u64::from(to) / g) as usize;
        let down = (u64::from(from) / g) as usize;

        let coeffs = if up == 1 && down == 1 {
            Vec::new()
        } else {
            let len = up
                .checked_mul(TAPS_PER_PHASE)
                .filter(|&n| n <= MAX_FILTER_LEN)
                .ok_or(DesignError::RatioTooComplex {
                    up: up as u32,
                    down: down as u32,
                })?;
            polyphase_bank(up, len)
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "resampler: {from} -> {to} Hz as {up}/{down}, {} taps",
            coeffs.len()
        );

        Ok(Self {
            from,
            to,
            up,
            down,
            coeffs,
            history: vec![0.0; 2 * TAPS_PER_PHASE],
            pos: 0,
            offset: 0,
        })
    }

    /// Source rate in Hz.
    pub fn input_rate(&self) -> u32 {
        self.from
    }

    /// Target rate in Hz.
    pub fn output_rate(&self) -> u32 {
        self.to
    }

    /// Reduced interpolation factor `L`.
    pub fn up(&self) -> usize {
        self.up
    }

    /// Reduced decimation factor `M`.
    pub fn down(&self) -> usize {
        self.down
    }

    /// True when the rates match and samples are copied through.
    pub fn is_identity(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Group delay measured in input samples.
    pub fn delay_input_samples(&self) -> f64 {
        if self.is_identity() {
            return 0.0;
        }
        (self.coeffs.len() - 1) as f64 / (2.0 * self.up as f64)
    }

    /// Group delay measured in output samples.
    pub fn delay_output_samples(&self) -> f64 {
        if self.is_identity() {
            return 0.0;
        }
        (self.coeffs.len() - 1) as f64 / (2.0 * self.down as f64)
    }

    /// Largest number of output samples `input_len` inputs can produce.
    pub fn max_output_len(&self, input_len: usize) -> usize {
        if self.is_identity() {
            return input_len;
        }
        (input_len * self.up).div_ceil(self.down) + 1
    }

    /// Resample `input` into `output`, returning the number of samples
    /// written.
    ///
    /// `output` must hold at least [`Self::max_output_len`] samples; anything
    /// beyond its end is dropped.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) -> usize {
        if self.is_identity() {
            let n = input.len().min(output.len());
            output[..n].copy_from_slice(&input[..n]);
            return n;
        }

        let mut written = 0;
        for &x in input {
            self.pos = if self.pos == 0 {
                TAPS_PER_PHASE - 1
            } else {
                self.pos - 1
            };
            self.history[self.pos] = x;
            self.history[self.pos + TAPS_PER_PHASE] = x;

            while self.offset < self.up {
                let phase = &self.coeffs
                    [self.offset * TAPS_PER_PHASE..(self.offset + 1) * TAPS_PER_PHASE];
                let window = &self.history[self.pos..self.pos + TAPS_PER_PHASE];
                let y = dot(phase, window);
                if let Some(slot) = output.get_mut(written) {
                    *slot = y;
                    written += 1;
                }
                self.offset += self.down;
            }
            self.offset -= self.up;
        }
        written
    }

    /// Clear history and phase.
    pub fn reset(&mut self) {
        self.history.fill(0.0);
        self.pos = 0;
        self.offset = 0;
    }
}

/// Prototype low-pass for interpolation by `up`, rearranged by phase.
fn polyphase_bank(up: usize, len: usize) -> Vec<f32> {
    // Cycles per upsampled sample; 0.5 / up is the input Nyquist
    let fc = 0.9 * 0.5 / up as f64;
    let center = (len - 1) as f64 / 2.0;

    let proto: Vec<f64> = (0..len)
        .map(|n| 2.0 * fc * sinc(2.0 * fc * (n as f64 - center)) * blackman(n, len))
        .collect();
    let sum: f64 = proto.iter().sum();
    let scale = up as f64 / sum;

    let mut coeffs = vec![0.0_f32; len];
    for p in 0..up {
        for k in 0..TAPS_PER_PHASE {
            coeffs[p * TAPS_PER_PHASE + k] = (proto[p + k * up] * scale) as f32;
        }
    }
    coeffs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduces_ratio() {
        let r = Resampler::new(44_100, 192_000).unwrap();
        assert_eq!((r.up(), r.down()), (640, 147));
        let r = Resampler::new(48_000, 192_000).unwrap();
        assert_eq!((r.up(), r.down()), (4, 1));
    }

    #[test]
    fn rejects_invalid_rates() {
        assert_eq!(
            Resampler::new(192_000, 48_000).unwrap_err(),
            DesignError::Downsampling {
                from: 192_000,
                to: 48_000
            }
        );
        assert_eq!(
            Resampler::new(0, 192_000).unwrap_err(),
            DesignError::ZeroSampleRate
        );
        // 192000 / 191999 cannot be reduced
        assert!(matches!(
            Resampler::new(191_999, 192_000),
            Err(DesignError::RatioTooComplex { .. })
        ));
    }

    #[test]
    fn identity_copies() {
        let mut r = Resampler::new(192_000, 192_000).unwrap();
        assert!(r.is_identity());
        let mut out = [0.0; 4];
        assert_eq!(r.process(&[1.0, 2.0, 3.0], &mut out), 3);
        assert_eq!(&out[..3], &[1.0, 2.0, 3.0]);
        assert_eq!(r.delay_output_samples(), 0.0);
    }

    #[test]
    fn output_count_tracks_ratio() {
        let mut r = Resampler::new(44_100, 192_000).unwrap();
        let input = vec![0.0; 441];
        let mut out = vec![0.0; r.max_output_len(441)];
        let mut total = 0;
        for _ in 0..100 {
            let n = r.process(&input, &mut out);
            assert!(n <= r.max_output_len(441));
            total += n;
        }
        // 44100 in -> 192000 out exactly, give or take the phase start
        assert!((total as i64 - 192_000).abs() <= 1, "total {total}");
    }

    #[test]
    fn dc_is_preserved() {
        let mut r = Resampler::new(48_000, 192_000).unwrap();
        let input = vec![1.0; 256];
        let mut out = vec![0.0; r.max_output_len(256)];
        let n = r.process(&input, &mut out);
        assert_eq!(n, 1024);
        for &y in &out[200..n] {
            assert!((y - 1.0).abs() < 1e-3, "{y}");
        }
    }
}
