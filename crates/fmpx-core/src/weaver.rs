//! Weaver single-sideband modulator.
//!
//! The baseband signal is mixed down with a quadrature local oscillator at
//! the middle of the audio band, low-passed to half the audio bandwidth, then
//! mixed back up around the carrier offset by the same LO frequency:
//!
//! ```text
//! I = LPF(x · cos φ1)          φ1: LO phase (7.5 kHz for 15 kHz audio)
//! Q = LPF(x · sin φ1)
//! y = 2 · (I · sin φ2 − Q · cos φ2),   φ2 = θc + φ1
//! ```
//!
//! For `x = cos(ωt)` this yields `y = sin(θc + ωt)`: only the upper sideband.
//! The LO phase used for the up-mix is the one the filtered sample was mixed
//! with, so the output stays coherent with the carrier despite the filter
//! delay.

use crate::{DesignError, FirFilter, Harmonic, Oscillator};

/// Weaver-method upper-sideband modulator.
#[derive(Debug, Clone)]
pub struct WeaverModulator {
    lo: Oscillator,
    i_lpf: FirFilter,
    q_lpf: FirFilter,
}

impl WeaverModulator {
    /// Build a modulator for audio of `bandwidth_hz` at `sample_rate`.
    ///
    /// The LO sits at `bandwidth_hz / 2` and both arms are low-passed there.
    pub fn new(num_taps: usize, bandwidth_hz: u32, sample_rate: u32) -> Result<Self, DesignError> {
        let lo_hz = bandwidth_hz / 2;
        let lo = Oscillator::new(lo_hz, sample_rate, 1)?;
        let i_lpf = FirFilter::lowpass(num_taps, lo_hz as f32, sample_rate as f32)?;
        let q_lpf = i_lpf.clone();
        Ok(Self { lo, i_lpf, q_lpf })
    }

    /// Group delay in samples.
    pub fn group_delay(&self) -> usize {
        self.i_lpf.group_delay()
    }

    /// LO frequency in Hz.
    pub fn lo_frequency(&self) -> u32 {
        self.lo.frequency()
    }

    /// Mix one baseband sample down and append it to both arms.
    #[inline]
    pub fn push(&mut self, x: f32) {
        let h = self.lo.harmonic(1);
        self.i_lpf.push(x * h.cos);
        self.q_lpf.push(x * h.sin);
        self.lo.advance();
    }

    /// Up-mix the filtered arms around `carrier` (its sine and cosine at the
    /// current sample).
    #[inline]
    pub fn output(&self, carrier: Harmonic) -> f32 {
        let i = self.i_lpf.output();
        let q = self.q_lpf.output();

        // LO phase of the sample now at the filter center
        let back = -(self.group_delay() as i64) - 1;
        let lo = self.lo.harmonic_at(1, back);

        let sin2 = carrier.sin * lo.cos + carrier.cos * lo.sin;
        let cos2 = carrier.cos * lo.cos - carrier.sin * lo.sin;
        2.0 * (i * sin2 - q * cos2)
    }

    /// Clear filter history and LO phase.
    pub fn reset(&mut self) {
        self.lo.reset();
        self.i_lpf.reset();
        self.q_lpf.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::TAU;

    #[test]
    fn produces_upper_sideband() {
        let fs = 192_000u32;
        let f = 5_000.0;
        let mut carrier = Oscillator::new(19_000, fs, 2).unwrap();
        let mut weaver = WeaverModulator::new(257, 15_000, fs).unwrap();
        let d = weaver.group_delay() as f64;

        for n in 0..3000 {
            let x = libm::cos(TAU * f * n as f64 / f64::from(fs)) as f32;
            weaver.push(x);
            let c = carrier.harmonic(2);
            let y = weaver.output(c);
            if n > 600 {
                let theta2 = TAU * 38_000.0 * n as f64 / f64::from(fs);
                let want = libm::sin(theta2 + TAU * f * (n as f64 - d) / f64::from(fs)) as f32;
                assert!((y - want).abs() < 5e-3, "n={n}: {y} vs {want}");
            }
            carrier.advance();
        }
    }

    #[test]
    fn rejects_lo_above_nyquist() {
        assert!(WeaverModulator::new(65, 200_000, 48_000).is_err());
    }
}
