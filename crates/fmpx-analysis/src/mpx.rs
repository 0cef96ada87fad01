//! Composite signal measurements.
//!
//! Splits a stereo multiplex spectrum into its broadcast bands:
//!
//! | Band | Range |
//! |---|---|
//! | mono (L+R) | 30 Hz – 15 kHz |
//! | pilot | 19 kHz ± 200 Hz |
//! | lower stereo sideband | 23 – 37.85 kHz |
//! | suppressed 38 kHz carrier | 38 kHz ± 100 Hz |
//! | upper stereo sideband | 38.15 – 53 kHz |
//! | RDS | 57 kHz ± 2.4 kHz |
//!
//! The sidebands reach to within 150 Hz of the carrier, so a difference
//! tone of 200 Hz or more lands in the right one. That needs frames of
//! 16384 samples at 192 kHz (11.7 Hz bins).

use crate::fft::Window;
use crate::spectrum::Spectrum;
use fmpx_core::linear_to_db;

/// Smallest sample rate that carries the RDS band.
pub const MIN_ANALYSIS_RATE: f32 = 120_000.0;

const FFT_SIZE: usize = 16_384;

/// Gap left on each side of the 38 kHz carrier.
const CARRIER_GUARD_HZ: f32 = 150.0;

/// Levels of each multiplex band, as linear amplitudes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MpxReport {
    /// Total level of the mono band.
    pub mono: f32,
    /// Pilot tone amplitude.
    pub pilot: f32,
    /// Total level below the 38 kHz carrier.
    pub lower_sideband: f32,
    /// Residual 38 kHz carrier.
    pub carrier_38k: f32,
    /// Total level above the 38 kHz carrier.
    pub upper_sideband: f32,
    /// Total level of the RDS band.
    pub rds: f32,
}

impl MpxReport {
    /// Upper minus lower sideband level, in dB.
    ///
    /// Positive for an upper-sideband signal, negative for a lower-sideband
    /// one, near zero for DSB.
    pub fn sideband_balance_db(&self) -> f32 {
        linear_to_db(self.upper_sideband) - linear_to_db(self.lower_sideband)
    }

    /// Combined stereo subcarrier level (both sidebands).
    pub fn stereo(&self) -> f32 {
        (self.lower_sideband * self.lower_sideband + self.upper_sideband * self.upper_sideband)
            .sqrt()
    }
}

/// Measure the multiplex bands of `signal` sampled at `sample_rate`.
///
/// Returns `None` when the rate is too low to contain the RDS band or the
/// signal is empty.
pub fn analyze_mpx(signal: &[f32], sample_rate: f32) -> Option<MpxReport> {
    if signal.is_empty() || sample_rate < MIN_ANALYSIS_RATE {
        return None;
    }
    let s = Spectrum::measure(signal, sample_rate, FFT_SIZE, Window::BlackmanHarris);

    Some(MpxReport {
        mono: s.band_level(30.0, 15_000.0),
        pilot: s.peak_in(18_800.0, 19_200.0),
        lower_sideband: s.band_level(23_000.0, 38_000.0 - CARRIER_GUARD_HZ),
        carrier_38k: s.peak_in(37_900.0, 38_100.0),
        upper_sideband: s.band_level(38_000.0 + CARRIER_GUARD_HZ, 53_000.0),
        rds: s.band_level(54_600.0, 59_400.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    fn synth(fs: f32, parts: &[(f32, f32)]) -> Vec<f32> {
        (0..32_768)
            .map(|n| {
                parts
                    .iter()
                    .map(|&(a, f)| a * (TAU * f * n as f32 / fs).sin())
                    .sum()
            })
            .collect()
    }

    #[test]
    fn rejects_low_rates() {
        assert!(analyze_mpx(&[0.0; 1000], 48_000.0).is_none());
        assert!(analyze_mpx(&[], 192_000.0).is_none());
    }

    #[test]
    fn separates_bands() {
        let fs = 192_000.0;
        let signal = synth(
            fs,
            &[(0.4, 1_000.0), (0.08, 19_000.0), (0.2, 43_000.0), (0.04, 57_000.0)],
        );
        let r = analyze_mpx(&signal, fs).unwrap();
        assert!((r.mono - 0.4).abs() < 0.03, "{r:?}");
        assert!((r.pilot - 0.08).abs() < 0.01, "{r:?}");
        assert!((r.upper_sideband - 0.2).abs() < 0.02, "{r:?}");
        assert!(r.lower_sideband < 1e-3, "{r:?}");
        assert!((r.rds - 0.04).abs() < 0.005, "{r:?}");
        assert!(r.sideband_balance_db() > 40.0);
    }

    #[test]
    fn resolves_sidebands_close_to_the_carrier() {
        let fs = 192_000.0;
        let upper = analyze_mpx(&synth(fs, &[(0.2, 38_300.0)]), fs).unwrap();
        assert!((upper.upper_sideband - 0.2).abs() < 0.02, "{upper:?}");
        assert!(upper.lower_sideband < 1e-3, "{upper:?}");

        let lower = analyze_mpx(&synth(fs, &[(0.2, 37_700.0)]), fs).unwrap();
        assert!((lower.lower_sideband - 0.2).abs() < 0.02, "{lower:?}");
        assert!(lower.sideband_balance_db() < -40.0, "{lower:?}");
    }
}
