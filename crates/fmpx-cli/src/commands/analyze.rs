//! Composite band analysis command.

use anyhow::Context;
use clap::Args;
use fmpx_analysis::{MIN_ANALYSIS_RATE, MpxReport, analyze_mpx};
use fmpx_core::linear_to_db;
use fmpx_io::{read_composite_wav, read_wav_info};
use std::path::PathBuf;

/// Stereo level below which the subcarrier counts as absent.
const STEREO_FLOOR: f32 = 1e-3;

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Composite WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Seconds to skip at the start while filters settle
    #[arg(long, default_value = "0.05")]
    skip: f64,
}

/// Which stereo sidebands a report shows.
fn sideband_kind(report: &MpxReport) -> &'static str {
    if report.stereo() < STEREO_FLOOR {
        "none"
    } else if report.sideband_balance_db() > 20.0 {
        "upper only (SSB)"
    } else if report.sideband_balance_db() < -20.0 {
        "lower only (SSB)"
    } else {
        "both (DSB)"
    }
}

pub fn run(args: AnalyzeArgs) -> anyhow::Result<()> {
    let info = read_wav_info(&args.input)
        .with_context(|| format!("cannot read {}", args.input.display()))?;
    let (composite, sample_rate) = read_composite_wav(&args.input)?;

    let skip = ((args.skip.max(0.0) * f64::from(sample_rate)) as usize).min(composite.len());
    let report = analyze_mpx(&composite[skip..], sample_rate as f32).with_context(|| {
        format!(
            "need a non-empty composite at {MIN_ANALYSIS_RATE} Hz or more, got {sample_rate} Hz"
        )
    })?;

    println!("Composite Analysis: {}", args.input.display());
    println!("==================\n");
    println!(
        "  {} Hz, {} channel(s), {:.2}s\n",
        info.sample_rate, info.channels, info.duration_secs
    );

    let rows = [
        ("Mono (L+R)", report.mono),
        ("Pilot 19 kHz", report.pilot),
        ("Lower sideband", report.lower_sideband),
        ("Carrier 38 kHz", report.carrier_38k),
        ("Upper sideband", report.upper_sideband),
        ("RDS 57 kHz", report.rds),
    ];
    for (label, level) in rows {
        println!("  {label:<16} {level:>10.5}  {:>8.1} dB", linear_to_db(level));
    }
    println!();
    println!("  Stereo sidebands: {}", sideband_kind(&report));
    if report.stereo() >= STEREO_FLOOR {
        println!("  Sideband balance: {:+.1} dB", report.sideband_balance_db());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(lower: f32, upper: f32) -> MpxReport {
        MpxReport {
            mono: 0.5,
            pilot: 0.08,
            lower_sideband: lower,
            carrier_38k: 0.0,
            upper_sideband: upper,
            rds: 0.0,
        }
    }

    #[test]
    fn classifies_sidebands() {
        assert_eq!(sideband_kind(&report(0.0, 0.0)), "none");
        assert_eq!(sideband_kind(&report(0.2, 0.2)), "both (DSB)");
        assert_eq!(sideband_kind(&report(0.001, 0.2)), "upper only (SSB)");
        assert_eq!(sideband_kind(&report(0.2, 0.001)), "lower only (SSB)");
    }
}
