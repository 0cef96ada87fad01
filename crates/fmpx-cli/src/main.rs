//! fmpx - FM stereo multiplex and RDS composite generator.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fmpx")]
#[command(author, version, about = "FM multiplex composite generator", long_about = None)]
struct Cli {
    /// Station file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override a control value, e.g. --set stereo_modulation=hartley
    #[arg(long = "set", global = true, value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate composite from live audio input
    Run(commands::run::RunArgs),

    /// Render a WAV file to a composite WAV file
    Render(commands::render::RenderArgs),

    /// Measure the multiplex bands of a composite WAV file
    Analyze(commands::analyze::AnalyzeArgs),

    /// List audio devices
    Devices(commands::devices::DevicesArgs),

    /// Show or create the station file
    Station(commands::station::StationArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let station = || commands::common::load_station(cli.config.as_deref(), &cli.overrides);

    match cli.command {
        Commands::Run(args) => commands::run::run(args, station()?),
        Commands::Render(args) => commands::render::run(args, station()?),
        Commands::Analyze(args) => commands::analyze::run(args),
        Commands::Devices(args) => commands::devices::run(args),
        Commands::Station(args) => {
            commands::station::run(args, cli.config.as_deref(), &cli.overrides)
        }
    }
}
