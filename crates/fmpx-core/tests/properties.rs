//! Property-based tests for fmpx-core DSP primitives.
//!
//! Tests oscillator phase bounds, filter linearity, resampler output counts
//! and parameter sanitizing using proptest for randomized inputs.

use fmpx_core::{
    FirFilter, HilbertTransformer, LinearRamp, Oscillator, PreEmphasis, Resampler, TAU_75US,
    sanitize,
};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Phase stays in `[0, fs)` and returns to zero after one full period.
    #[test]
    fn oscillator_phase_is_periodic(
        freq in 1u32..40_000,
        steps in 0usize..5_000,
    ) {
        let fs = 192_000;
        let mut osc = Oscillator::new(freq, fs, 1).unwrap();
        for _ in 0..steps {
            osc.advance();
            prop_assert!(osc.phase_index() < fs);
        }
        let before = osc.phase_index();
        for _ in 0..osc.period_samples() {
            osc.advance();
        }
        prop_assert_eq!(osc.phase_index(), before);
    }

    /// Harmonic values always lie on the unit circle.
    #[test]
    fn harmonics_on_unit_circle(
        steps in 0usize..2_000,
        k in 1u32..=3,
        offset in -10_000i64..10_000,
    ) {
        let mut osc = Oscillator::new(19_000, 192_000, 3).unwrap();
        for _ in 0..steps {
            osc.advance();
        }
        let h = osc.harmonic_at(k, offset);
        prop_assert!((h.sin * h.sin + h.cos * h.cos - 1.0).abs() < 1e-5);
    }

    /// FIR output is linear: f(a·x + y) = a·f(x) + f(y).
    #[test]
    fn fir_is_linear(
        a in -2.0f32..2.0,
        x in prop::array::uniform32(-1.0f32..=1.0f32),
        y in prop::array::uniform32(-1.0f32..=1.0f32),
    ) {
        let proto = FirFilter::lowpass(31, 5_000.0, 48_000.0).unwrap();
        let (mut fx, mut fy, mut fs) = (proto.clone(), proto.clone(), proto);
        for i in 0..32 {
            let ox = fx.process(x[i]);
            let oy = fy.process(y[i]);
            let os = fs.process(a * x[i] + y[i]);
            prop_assert!((os - (a * ox + oy)).abs() < 1e-4);
        }
    }

    /// Hilbert outputs stay bounded for bounded input.
    #[test]
    fn hilbert_is_bounded(input in prop::collection::vec(-1.0f32..=1.0f32, 1..600)) {
        let mut ht = HilbertTransformer::new(129).unwrap();
        for &x in &input {
            let (re, im) = ht.process(x);
            prop_assert!(re.abs() <= 1.0);
            // sum of |h| for a 129-tap windowed Hilbert is below 4
            prop_assert!(im.abs() < 4.0);
        }
    }

    /// Output count never exceeds the advertised maximum and sums to the
    /// exact rate ratio over whole seconds.
    #[test]
    fn resampler_output_count(
        from in prop::sample::select(vec![8_000u32, 22_050, 32_000, 44_100, 48_000, 96_000]),
        period in 1usize..2_048,
    ) {
        let mut rs = Resampler::new(from, 192_000).unwrap();
        let input = vec![0.0_f32; period];
        let mut out = vec![0.0_f32; rs.max_output_len(period)];
        let mut total = 0u64;
        let ticks = 8;
        for _ in 0..ticks {
            let n = rs.process(&input, &mut out);
            prop_assert!(n <= rs.max_output_len(period));
            total += n as u64;
        }
        let exact = (ticks * period) as u64 * 192_000 / u64::from(from);
        prop_assert!(total.abs_diff(exact) <= 1, "total {} exact {}", total, exact);
    }

    /// Pre-emphasis stays finite on arbitrary bounded input.
    #[test]
    fn preemphasis_stability(input in prop::array::uniform32(-1.0f32..=1.0f32)) {
        let mut p = PreEmphasis::new(TAU_75US, 44_100.0).unwrap();
        for &x in &input {
            let y = p.process(x);
            prop_assert!(y.is_finite() && y.abs() < 20.0);
        }
    }

    /// Ramps never overshoot their endpoints.
    #[test]
    fn ramp_stays_between_endpoints(
        start in 0.0f32..2.0,
        end in 0.0f32..2.0,
        len in 1u32..4_096,
    ) {
        let mut r = LinearRamp::new(start);
        r.set_target_over(end, len);
        let (lo, hi) = (start.min(end) - 1e-5, start.max(end) + 1e-5);
        for _ in 0..len {
            let v = r.advance();
            prop_assert!(v >= lo && v <= hi);
        }
        prop_assert_eq!(r.get(), end);
    }

    /// Sanitized values are always finite and inside the range.
    #[test]
    fn sanitize_bounds(v in any::<f32>()) {
        let s = sanitize(v, 0.0, 2.0, 0.4);
        prop_assert!(s.is_finite());
        prop_assert!((0.0..=2.0).contains(&s));
    }
}
