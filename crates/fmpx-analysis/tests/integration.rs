//! Integration tests for fmpx-analysis: composite spectra built from the
//! fmpx-core primitives.

use fmpx_analysis::analyze_mpx;
use fmpx_core::{HilbertTransformer, Oscillator};

const FS: u32 = 192_000;

/// Pilot plus a DSB or Hartley-SSB subcarrier carrying a 3 kHz tone.
fn composite(ssb: bool) -> Vec<f32> {
    let mut osc = Oscillator::new(19_000, FS, 3).unwrap();
    let mut ht = HilbertTransformer::new(257).unwrap();
    let mut out = Vec::with_capacity(65_536);
    for n in 0..65_536 {
        let x = (std::f64::consts::TAU * 3_000.0 * n as f64 / f64::from(FS)).sin() as f32;
        let (re, im) = ht.process(x);
        let c = osc.harmonic(2);
        let sub = if ssb { re * c.sin + im * c.cos } else { re * c.sin };
        out.push(0.08 * osc.harmonic(1).sin + 0.4 * sub);
        osc.advance();
    }
    out
}

#[test]
fn dsb_sidebands_are_balanced() {
    let r = analyze_mpx(&composite(false), FS as f32).unwrap();
    assert!(r.sideband_balance_db().abs() < 0.5, "{r:?}");
    assert!(r.carrier_38k < 1e-3, "{r:?}");
    assert!((r.pilot - 0.08).abs() < 0.01, "{r:?}");
}

#[test]
fn hartley_ssb_reads_as_upper_sideband() {
    let r = analyze_mpx(&composite(true), FS as f32).unwrap();
    assert!(r.sideband_balance_db() > 30.0, "{r:?}");
    assert!((r.upper_sideband - 0.4).abs() < 0.02, "{r:?}");
    assert!(r.rds < 1e-3, "{r:?}");
}
