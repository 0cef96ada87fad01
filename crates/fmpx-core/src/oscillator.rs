//! Phase-coherent harmonic oscillator.
//!
//! The stereo multiplex needs three carriers that must stay locked to each
//! other forever: the 19 kHz pilot, the 38 kHz stereo subcarrier and the
//! 57 kHz RDS subcarrier. All three are derived here from one phase counter.
//!
//! # Exact phase
//!
//! Phase is held as an integer `p ∈ [0, fs)` that advances by the integer
//! frequency each sample:
//!
//! ```text
//! p[n+1] = (p[n] + f) mod fs
//! θk[n]  = 2π · (k·p[n] mod fs) / fs
//! ```
//!
//! Because the accumulator is an integer modulo the sample rate, the phase
//! never drifts and never grows, no matter how long the station runs. The
//! floating-point angle is recomputed from the integer every sample, so
//! rounding error does not accumulate either.
//!
//! # Example
//!
//! ```rust
//! use fmpx_core::Oscillator;
//!
//! let mut osc = Oscillator::new(19_000, 192_000, 3).unwrap();
//! let pilot = osc.harmonic(1);
//! let rds = osc.harmonic(3);
//! assert_eq!(pilot.sin, 0.0);
//! assert_eq!(rds.cos, 1.0);
//! osc.advance();
//! ```

use crate::DesignError;
use core::f64::consts::TAU;
use libm::sincos;

/// Sine and cosine of one harmonic at the current phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Harmonic {
    /// `sin(k·θ)`
    pub sin: f32,
    /// `cos(k·θ)`
    pub cos: f32,
}

/// Integer-phase oscillator producing synchronized harmonics.
///
/// # Invariants
///
/// - `phase < sample_rate` at all times
/// - `highest_harmonic · frequency < sample_rate / 2`
#[derive(Debug, Clone)]
pub struct Oscillator {
    frequency: u32,
    sample_rate: u32,
    highest_harmonic: u32,
    phase: u32,
}

impl Oscillator {
    /// Create an oscillator at `frequency_hz` that may be queried up to the
    /// `highest_harmonic`-th harmonic.
    ///
    /// Fails when either rate is zero or when the highest harmonic would not
    /// be representable below Nyquist.
    pub fn new(
        frequency_hz: u32,
        sample_rate: u32,
        highest_harmonic: u32,
    ) -> Result<Self, DesignError> {
        if sample_rate == 0 {
            return Err(DesignError::ZeroSampleRate);
        }
        if frequency_hz == 0 {
            return Err(DesignError::ZeroFrequency);
        }
        let highest_harmonic = highest_harmonic.max(1);
        let top = u64::from(frequency_hz) * u64::from(highest_harmonic);
        if 2 * top >= u64::from(sample_rate) {
            return Err(DesignError::AboveNyquist {
                frequency_hz: top,
                sample_rate,
            });
        }

        Ok(Self {
            frequency: frequency_hz,
            sample_rate,
            highest_harmonic,
            phase: 0,
        })
    }

    /// Fundamental frequency in Hz.
    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Raw phase counter, in `[0, sample_rate)`.
    pub fn phase_index(&self) -> u32 {
        self.phase
    }

    /// Samples in one full period of the fundamental's phase pattern.
    pub fn period_samples(&self) -> u32 {
        self.sample_rate / crate::gcd(u64::from(self.frequency), u64::from(self.sample_rate)) as u32
    }

    /// Step the phase by one sample.
    #[inline]
    pub fn advance(&mut self) {
        let next = u64::from(self.phase) + u64::from(self.frequency);
        self.phase = (next % u64::from(self.sample_rate)) as u32;
    }

    /// Harmonic `k` at the current phase.
    #[inline]
    pub fn harmonic(&self, k: u32) -> Harmonic {
        debug_assert!(k <= self.highest_harmonic);
        let index = (u64::from(k) * u64::from(self.phase)) % u64::from(self.sample_rate);
        self.angle(index)
    }

    /// Harmonic `k` at `offset` samples away from the current phase.
    ///
    /// Negative offsets look into the past. Used to keep carriers coherent
    /// with audio that has been delayed by a filter.
    #[inline]
    pub fn harmonic_at(&self, k: u32, offset: i64) -> Harmonic {
        debug_assert!(k <= self.highest_harmonic);
        let fs = i128::from(self.sample_rate);
        let shifted = (i128::from(self.phase) + i128::from(offset) * i128::from(self.frequency))
            .rem_euclid(fs);
        let index = (i128::from(k) * shifted).rem_euclid(fs);
        self.angle(index as u64)
    }

    /// Reset the phase to zero.
    pub fn reset(&mut self) {
        self.phase = 0;
    }

    #[inline]
    fn angle(&self, index: u64) -> Harmonic {
        let theta = TAU * index as f64 / f64::from(self.sample_rate);
        let (s, c) = sincos(theta);
        Harmonic {
            sin: s as f32,
            cos: c as f32,
        }
    }
}
