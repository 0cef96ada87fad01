//! FM pre-emphasis shelf.
//!
//! Broadcast FM boosts treble before modulation so the receiver's matching
//! de-emphasis lowers the hiss picked up in transit. The analog prototype is
//! a first-order shelf with unity DC gain:
//!
//! ```text
//!          1 + s·τ1
//! H(s) = ----------     τ1 = 50 µs (Europe) or 75 µs (Americas)
//!          1 + s·τ2     τ2 = 1 / (2π · 20 kHz), limits the boost
//! ```
//!
//! discretized with the bilinear transform (`s = 2·fs·(1 − z⁻¹)/(1 + z⁻¹)`).

use crate::{DesignError, flush_denormal};
use core::f32::consts::PI;

/// 50 µs time constant (ITU-R, Europe).
pub const TAU_50US: f32 = 50e-6;
/// 75 µs time constant (North America, Korea).
pub const TAU_75US: f32 = 75e-6;
/// Corner of the shelf's upper limit.
pub const SHELF_LIMIT_HZ: f32 = 20_000.0;

/// First-order pre-emphasis filter.
#[derive(Debug, Clone)]
pub struct PreEmphasis {
    b0: f32,
    b1: f32,
    a1: f32,
    x1: f32,
    y1: f32,
    tau: f32,
    sample_rate: f32,
}

impl PreEmphasis {
    /// Create a filter for time constant `tau` seconds at `sample_rate`.
    pub fn new(tau: f32, sample_rate: f32) -> Result<Self, DesignError> {
        if sample_rate.is_nan() || sample_rate <= 0.0 {
            return Err(DesignError::ZeroSampleRate);
        }
        let mut filter = Self {
            b0: 1.0,
            b1: 0.0,
            a1: 0.0,
            x1: 0.0,
            y1: 0.0,
            tau,
            sample_rate,
        };
        filter.set_time_constant(tau)?;
        Ok(filter)
    }

    /// Current time constant in seconds.
    pub fn time_constant(&self) -> f32 {
        self.tau
    }

    /// Change the time constant, keeping the filter state.
    pub fn set_time_constant(&mut self, tau: f32) -> Result<(), DesignError> {
        if !tau.is_finite() || tau <= 0.0 {
            return Err(DesignError::InvalidTimeConstant);
        }
        let k = 2.0 * self.sample_rate;
        let tau2 = 1.0 / (2.0 * PI * SHELF_LIMIT_HZ);
        let norm = 1.0 + k * tau2;

        self.b0 = (1.0 + k * tau) / norm;
        self.b1 = (1.0 - k * tau) / norm;
        self.a1 = (1.0 - k * tau2) / norm;
        self.tau = tau;
        Ok(())
    }

    /// Filter one sample.
    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        let y = self.b0 * x + self.b1 * self.x1 - self.a1 * self.y1;
        self.x1 = x;
        self.y1 = flush_denormal(y);
        y
    }

    /// Clear the filter state.
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.y1 = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::TAU;

    fn gain_at(freq: f32, tau: f32) -> f32 {
        let fs = 48_000.0;
        let mut p = PreEmphasis::new(tau, fs).unwrap();
        let mut peak = 0.0_f32;
        for n in 0..48_000 {
            let y = p.process(libm::sinf(TAU * freq * n as f32 / fs));
            if n > 24_000 {
                peak = peak.max(y.abs());
            }
        }
        peak
    }

    #[test]
    fn unity_at_dc() {
        let mut p = PreEmphasis::new(TAU_50US, 48_000.0).unwrap();
        let mut y = 0.0;
        for _ in 0..5000 {
            y = p.process(1.0);
        }
        assert!((y - 1.0).abs() < 1e-4);
    }

    #[test]
    fn boosts_treble() {
        // 50 µs corner is ~3.2 kHz; 10 kHz should be boosted by several dB
        let low = gain_at(100.0, TAU_50US);
        let high = gain_at(10_000.0, TAU_50US);
        assert!((low - 1.0).abs() < 0.01, "low {low}");
        assert!(high > 2.5, "high {high}");
        assert!(gain_at(10_000.0, TAU_75US) > high);
    }

    #[test]
    fn rejects_bad_time_constant() {
        assert_eq!(
            PreEmphasis::new(0.0, 48_000.0).unwrap_err(),
            DesignError::InvalidTimeConstant
        );
        let mut p = PreEmphasis::new(TAU_75US, 48_000.0).unwrap();
        assert!(p.set_time_constant(f32::NAN).is_err());
        assert_eq!(p.time_constant(), TAU_75US);
    }
}
