//! Mathematical utility functions for DSP.
//!
//! Allocation-free helpers shared by the filter designs, the resampler and the
//! composite generator. Everything here is `no_std` and uses `libm`.
//!
//! - [`db_to_linear`] / [`linear_to_db`] - Level conversions
//! - [`sinc`] / [`blackman`] - Windowed-sinc building blocks
//! - [`gcd`] - Rate ratio reduction
//! - [`sanitize`] - Range validation for values from untrusted writers
//! - [`dot`] - Inner product for FIR convolution

use core::f64::consts::PI;
use libm::{cos, expf, logf, sin};

/// Convert decibels to linear gain.
///
/// # Example
/// ```rust
/// use fmpx_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-20.0) - 0.1).abs() < 0.001);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    // 10^(dB/20) = e^(dB * ln(10) / 20)
    expf(db * core::f32::consts::LN_10 / 20.0)
}

/// Convert linear gain to decibels.
///
/// Values at or below zero are floored to -200 dB instead of producing
/// `-inf`, so the result is always usable in comparisons.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 1e-10 {
        return -200.0;
    }
    20.0 * logf(linear) / core::f32::consts::LN_10
}

/// Normalized sinc: `sin(πx) / (πx)`, with `sinc(0) = 1`.
#[inline]
pub fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-12 {
        1.0
    } else {
        sin(PI * x) / (PI * x)
    }
}

/// Blackman window value for tap `n` of an `len`-tap window.
///
/// `w[n] = 0.42 - 0.5·cos(2πn/M) + 0.08·cos(4πn/M)`, `M = len - 1`.
#[inline]
pub fn blackman(n: usize, len: usize) -> f64 {
    if len <= 1 {
        return 1.0;
    }
    let phase = 2.0 * PI * n as f64 / (len - 1) as f64;
    0.42 - 0.5 * cos(phase) + 0.08 * cos(2.0 * phase)
}

/// Greatest common divisor (Euclid).
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

/// Flush subnormal floats to zero.
///
/// Values below 1e-20 are replaced with zero, leaving margin before the
/// IEEE 754 subnormal range where some CPUs slow down by orders of magnitude.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}

/// Validate a value coming from an untrusted writer.
///
/// Non-finite input yields `default`; finite input is clamped to `[min, max]`.
#[inline]
pub fn sanitize(value: f32, min: f32, max: f32, default: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        default
    }
}

/// Inner product of the common prefix of `a` and `b`.
///
/// Accumulates in eight independent lanes so the loop vectorizes; long
/// encoder filters spend nearly all their time here.
///
/// # Example
/// ```rust
/// use fmpx_core::dot;
///
/// assert_eq!(dot(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]), 32.0);
/// ```
#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    const LANES: usize = 8;
    let n = a.len().min(b.len());
    let a = a[..n].chunks_exact(LANES);
    let b = b[..n].chunks_exact(LANES);
    let tail: f32 = a
        .remainder()
        .iter()
        .zip(b.remainder())
        .map(|(&x, &y)| x * y)
        .sum();

    let mut acc = [0.0_f32; LANES];
    for (x, y) in a.zip(b) {
        for k in 0..LANES {
            acc[k] += x[k] * y[k];
        }
    }
    acc.iter().sum::<f32>() + tail
}

/// Maximum absolute sample value of a block (0.0 for an empty block).
///
/// A NaN anywhere in the block makes the result NaN, so a broken signal
/// shows up on the meter instead of reading as silence.
#[inline]
pub fn peak_abs(block: &[f32]) -> f32 {
    block.iter().fold(0.0_f32, |acc, &s| {
        let a = s.abs();
        if a > acc || a.is_nan() { a } else { acc }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_linear_roundtrip() {
        let original = 0.5;
        let back = db_to_linear(linear_to_db(original));
        assert!((original - back).abs() < 1e-5, "{original} -> {back}");
    }

    #[test]
    fn linear_to_db_floors_silence() {
        assert_eq!(linear_to_db(0.0), -200.0);
        assert_eq!(linear_to_db(-1.0), -200.0);
    }

    #[test]
    fn sinc_zeros_at_integers() {
        assert_eq!(sinc(0.0), 1.0);
        for k in 1..5 {
            assert!(sinc(k as f64).abs() < 1e-12);
        }
    }

    #[test]
    fn blackman_is_symmetric_and_zero_at_edges() {
        let len = 31;
        assert!(blackman(0, len).abs() < 1e-12);
        assert!((blackman(15, len) - 1.0).abs() < 1e-12);
        for n in 0..len {
            assert!((blackman(n, len) - blackman(len - 1 - n, len)).abs() < 1e-12);
        }
    }

    #[test]
    fn gcd_reduces_broadcast_rates() {
        assert_eq!(gcd(192_000, 48_000), 48_000);
        assert_eq!(gcd(192_000, 44_100), 300);
        assert_eq!(gcd(19_000, 192_000), 1_000);
    }

    #[test]
    fn sanitize_rejects_non_finite() {
        assert_eq!(sanitize(f32::NAN, 0.0, 2.0, 0.4), 0.4);
        assert_eq!(sanitize(f32::INFINITY, 0.0, 2.0, 0.4), 0.4);
        assert_eq!(sanitize(5.0, 0.0, 2.0, 0.4), 2.0);
        assert_eq!(sanitize(-1.0, 0.0, 2.0, 0.4), 0.0);
        assert_eq!(sanitize(1.5, 0.0, 2.0, 0.4), 1.5);
    }

    #[test]
    fn peak_abs_tracks_negative_excursions() {
        assert_eq!(peak_abs(&[0.1, -0.75, 0.5]), 0.75);
        assert_eq!(peak_abs(&[]), 0.0);
    }

    #[test]
    fn dot_matches_naive_sum() {
        let a: [f32; 21] = core::array::from_fn(|i| i as f32 * 0.5 - 3.0);
        let b: [f32; 21] = core::array::from_fn(|i| 1.0 / (i as f32 + 1.0));
        let naive: f32 = a.iter().zip(&b).map(|(x, y)| x * y).sum();
        assert!((dot(&a, &b) - naive).abs() < 1e-5);
        assert_eq!(dot(&a[..3], &b), dot(&a[..3], &b[..3]));
        assert_eq!(dot(&[], &b), 0.0);
    }

    #[test]
    fn peak_abs_keeps_nan_visible() {
        assert!(peak_abs(&[0.2, f32::NAN, 0.9]).is_nan());
        assert!(peak_abs(&[f32::NAN, 0.0]).is_nan());
        assert_eq!(peak_abs(&[0.2, f32::NEG_INFINITY]), f32::INFINITY);
    }
}
