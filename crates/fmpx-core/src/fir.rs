//! Streaming FIR filter and windowed-sinc low-pass design.
//!
//! [`FirFilter`] keeps its history in a doubled ring buffer so the
//! convolution always reads one contiguous slice, newest sample first:
//!
//! ```text
//! history[pos..pos + N] = [x[n], x[n-1], ..., x[n-N+1]]
//! ```
//!
//! Pushing a sample and computing the output are separate operations. A
//! filter whose output is not currently needed can keep taking samples with
//! [`FirFilter::push`] at the cost of two stores, so it is warm the moment it
//! is switched back in.

use crate::{DesignError, blackman, dot, sinc};
use alloc::vec;
use alloc::vec::Vec;

/// Design a linear-phase windowed-sinc low-pass filter (Blackman window).
///
/// `num_taps` must be odd so the filter has an integer group delay of
/// `(num_taps - 1) / 2`. The taps are normalized to unity DC gain.
///
/// # Example
///
/// ```rust
/// use fmpx_core::design_lowpass;
///
/// let taps = design_lowpass(129, 15_000.0, 192_000.0).unwrap();
/// let dc: f32 = taps.iter().sum();
/// assert!((dc - 1.0).abs() < 1e-5);
/// ```
pub fn design_lowpass(
    num_taps: usize,
    cutoff_hz: f32,
    sample_rate: f32,
) -> Result<Vec<f32>, DesignError> {
    if sample_rate.is_nan() || sample_rate <= 0.0 {
        return Err(DesignError::ZeroSampleRate);
    }
    if num_taps == 0 || num_taps % 2 == 0 {
        return Err(DesignError::InvalidTaps(num_taps));
    }
    if cutoff_hz.is_nan() || cutoff_hz <= 0.0 || cutoff_hz >= sample_rate / 2.0 {
        return Err(DesignError::InvalidCutoff {
            cutoff_hz,
            sample_rate,
        });
    }

    // Normalized to the sample rate: 0.5 = Nyquist
    let fc = f64::from(cutoff_hz) / f64::from(sample_rate);
    let center = (num_taps / 2) as f64;

    let mut taps: Vec<f64> = (0..num_taps)
        .map(|n| 2.0 * fc * sinc(2.0 * fc * (n as f64 - center)) * blackman(n, num_taps))
        .collect();

    let sum: f64 = taps.iter().sum();
    if sum.abs() > 1e-12 {
        for t in &mut taps {
            *t /= sum;
        }
    }

    Ok(taps.into_iter().map(|t| t as f32).collect())
}

/// Streaming direct-form FIR filter with fixed-length history.
#[derive(Debug, Clone)]
pub struct FirFilter {
    taps: Vec<f32>,
    history: Vec<f32>,
    pos: usize,
}

impl FirFilter {
    /// Build a filter from explicit taps.
    pub fn new(taps: Vec<f32>) -> Result<Self, DesignError> {
        if taps.is_empty() {
            return Err(DesignError::InvalidTaps(0));
        }
        let len = taps.len();
        Ok(Self {
            taps,
            history: vec![0.0; 2 * len],
            pos: 0,
        })
    }

    /// Build a windowed-sinc low-pass filter. See [`design_lowpass`].
    pub fn lowpass(num_taps: usize, cutoff_hz: f32, sample_rate: f32) -> Result<Self, DesignError> {
        Self::new(design_lowpass(num_taps, cutoff_hz, sample_rate)?)
    }

    /// Number of taps.
    pub fn len(&self) -> usize {
        self.taps.len()
    }

    /// Always false; a filter has at least one tap.
    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    /// Filter coefficients.
    pub fn taps(&self) -> &[f32] {
        &self.taps
    }

    /// Group delay in samples for a symmetric filter.
    pub fn group_delay(&self) -> usize {
        (self.taps.len() - 1) / 2
    }

    /// Append one input sample without computing an output.
    #[inline]
    pub fn push(&mut self, x: f32) {
        let len = self.taps.len();
        self.pos = if self.pos == 0 { len - 1 } else { self.pos - 1 };
        self.history[self.pos] = x;
        self.history[self.pos + len] = x;
    }

    /// Convolve the current history with the taps.
    #[inline]
    pub fn output(&self) -> f32 {
        let len = self.taps.len();
        dot(&self.taps, &self.history[self.pos..self.pos + len])
    }

    /// Push a sample and return the filtered output.
    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        self.push(x);
        self.output()
    }

    /// Input sample from `delay` pushes ago (`delay < len`).
    #[inline]
    pub fn delayed(&self, delay: usize) -> f32 {
        debug_assert!(delay < self.taps.len());
        self.history[self.pos + delay]
    }

    /// Input sample at the filter's center tap, aligned with [`Self::output`].
    #[inline]
    pub fn center(&self) -> f32 {
        self.delayed(self.group_delay())
    }

    /// Clear the history.
    pub fn reset(&mut self) {
        self.history.fill(0.0);
        self.pos = 0;
    }
}
