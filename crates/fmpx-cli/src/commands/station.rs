//! Station file commands.

use crate::commands::common::load_station;
use anyhow::Context;
use clap::{Args, Subcommand};
use fmpx_config::{STATION_FILE, StationConfig, default_station_path, ensure_user_config_dir};
use std::path::Path;

#[derive(Args)]
pub struct StationArgs {
    #[command(subcommand)]
    command: StationCommand,
}

#[derive(Subcommand)]
enum StationCommand {
    /// Print the effective station configuration as TOML
    Show,

    /// Print the station file location
    Path,

    /// Write a station file with default values and any --set overrides
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn run(args: StationArgs, path: Option<&Path>, overrides: &[String]) -> anyhow::Result<()> {
    match args.command {
        StationCommand::Show => {
            let station = load_station(path, overrides)?;
            print!("{}", station.to_toml()?);
        }

        StationCommand::Path => match path {
            Some(path) => println!("{}", path.display()),
            None => println!("{}", default_station_path().display()),
        },

        StationCommand::Init { force } => {
            let target = match path {
                Some(path) => path.to_path_buf(),
                None => ensure_user_config_dir()?.join(STATION_FILE),
            };
            if target.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    target.display()
                );
            }

            let mut station = StationConfig::default();
            for assignment in overrides {
                station
                    .apply_override(assignment)
                    .with_context(|| format!("in --set {assignment}"))?;
            }
            station.validate()?;
            station.save(&target)?;
            println!("Wrote {}", target.display());
        }
    }

    Ok(())
}
