//! Offline composite rendering command.

use crate::commands::common::describe_pipeline;
use anyhow::Context;
use clap::Args;
use fmpx_config::StationConfig;
use fmpx_core::peak_abs;
use fmpx_engine::{ControlBlock, Pipeline, PipelineConfig, SilentRds};
use fmpx_io::{read_wav_stereo, write_composite_wav};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args)]
pub struct RenderArgs {
    /// Program audio WAV file (mono or stereo, any rate)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Composite WAV file to write (mono float at the processing rate)
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Period size in frames
    #[arg(long, default_value = "1024")]
    block_size: usize,
}

pub fn run(args: RenderArgs, station: StationConfig) -> anyhow::Result<()> {
    println!("Reading {}...", args.input.display());
    let (program, sample_rate) = read_wav_stereo(&args.input)
        .with_context(|| format!("cannot read {}", args.input.display()))?;
    if program.is_empty() {
        anyhow::bail!("{} contains no audio", args.input.display());
    }
    println!(
        "  {} frames, {} Hz, {:.2}s",
        program.len(),
        sample_rate,
        program.len() as f64 / f64::from(sample_rate)
    );

    // The composite is collected from the network handoff at the
    // processing rate, whatever the input rate.
    let control = Arc::new(ControlBlock::from_snapshot(&station.snapshot()?));
    let config = PipelineConfig {
        network_enabled: true,
        ..station.pipeline_config(sample_rate, args.block_size)
    };
    let mut pipeline = Pipeline::new(config, Arc::clone(&control), Box::new(SilentRds))?;
    let consumer = pipeline
        .take_network_consumer()
        .context("pipeline has no network output")?;
    pipeline.start()?;
    println!("  {}", describe_pipeline(&pipeline));

    let pb = ProgressBar::new(program.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    let periods = program.len().div_ceil(args.block_size);
    let mut composite = Vec::with_capacity(pipeline.max_output_len() * periods);
    let mut port = vec![0.0; args.block_size];
    for (left, right) in program
        .left
        .chunks(args.block_size)
        .zip(program.right.chunks(args.block_size))
    {
        pipeline.process(left, right, &mut port[..left.len()])?;
        while let Some(buf) = consumer.try_recv() {
            composite.extend_from_slice(&buf);
        }
        pb.inc(left.len() as u64);
    }
    pb.finish_and_clear();

    let overruns = consumer.overruns();
    if overruns > 0 {
        tracing::warn!(overruns, "composite buffers were overwritten during render");
    }

    let rate = pipeline.processing_rate();
    write_composite_wav(&args.output, &composite, rate)
        .with_context(|| format!("cannot write {}", args.output.display()))?;
    println!(
        "Wrote {} ({} samples at {} Hz, peak {:.3})",
        args.output.display(),
        composite.len(),
        rate,
        peak_abs(&composite)
    );
    Ok(())
}
