//! Live composite generation command.

use crate::commands::common::describe_pipeline;
use anyhow::Context;
use clap::Args;
use fmpx_config::StationConfig;
use fmpx_engine::{ControlBlock, Pipeline, SilentRds};
use fmpx_io::{AudioBackend, CpalBackend, StreamSettings, UdpSink, spawn_sender, start_realtime};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

#[derive(Args)]
pub struct RunArgs {
    /// Input device name (partial match)
    #[arg(long)]
    input_device: Option<String>,

    /// Output device name (partial match)
    #[arg(long)]
    output_device: Option<String>,

    /// Device sample rate (default: ask for 192000 and accept what the
    /// device offers)
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Buffer size in frames
    #[arg(long)]
    buffer_size: Option<u32>,

    /// Also send composite to the station's network target
    #[arg(long)]
    network: bool,

    /// Print peak meters once per second
    #[arg(long)]
    meters: bool,
}

pub fn run(args: RunArgs, station: StationConfig) -> anyhow::Result<()> {
    let settings = StreamSettings {
        sample_rate: args.sample_rate.or(station.audio.sample_rate),
        buffer_size: args.buffer_size.unwrap_or(station.audio.buffer_size),
        input_device: args.input_device.or(station.audio.input_device.clone()),
        output_device: args.output_device.or(station.audio.output_device.clone()),
    };

    let backend = CpalBackend::new();
    let negotiated = settings.negotiate(&backend)?;

    let control = Arc::new(ControlBlock::from_snapshot(&station.snapshot()?));
    let mut config = station.pipeline_config(negotiated.sample_rate, negotiated.max_period);
    config.network_enabled |= args.network;
    let mut pipeline = Pipeline::new(config, Arc::clone(&control), Box::new(SilentRds))
        .context("cannot build the composite pipeline for this device")?;

    println!("fmpx on {} backend", backend.name());
    println!("  {}", describe_pipeline(&pipeline));
    println!("  Stereo mode: {}", station.mpx.stereo_mode);

    let sender = match pipeline.take_network_consumer() {
        Some(consumer) => {
            let target: SocketAddr = station
                .network
                .target
                .parse()
                .with_context(|| format!("bad network target '{}'", station.network.target))?;
            let sink = UdpSink::connect(target)?;
            println!("  Network: UDP to {target}");
            Some(spawn_sender(consumer, sink)?)
        }
        None => None,
    };

    let session = start_realtime(&backend, pipeline, &settings, &negotiated)?;
    let handle = session.shutdown_handle();
    let stop = handle.clone();
    ctrlc::set_handler(move || {
        println!("\nStopping...");
        stop.shutdown();
    })?;
    println!("\nPress Ctrl+C to stop...\n");

    let mut ticks = 0u32;
    while handle.is_active() {
        std::thread::sleep(Duration::from_millis(100));
        ticks += 1;
        if args.meters && ticks == 10 {
            ticks = 0;
            println!(
                "mpx {:6.3}  L {:6.3}  R {:6.3}",
                control.peak_mpx_out(),
                control.peak_audio_in_l(),
                control.peak_audio_in_r()
            );
        }
    }

    let stats = session.stats();
    println!(
        "Underruns: {}, oversized callbacks: {}, dropped input samples: {}, device errors: {}",
        stats.underruns(),
        stats.oversized(),
        stats.dropped_input(),
        stats.backend_errors()
    );
    session.stop();

    if let Some(sender) = sender {
        let sent = sender.stop()?;
        println!(
            "Network: {} buffers sent, {} overwritten, {} failed",
            sent.buffers, sent.overruns, sent.send_errors
        );
    }

    println!("Done!");
    Ok(())
}
