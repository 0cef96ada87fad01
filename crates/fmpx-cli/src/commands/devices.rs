//! Audio device listing command.

use clap::{Args, Subcommand};
use fmpx_engine::MIN_MPX_RATE;
use fmpx_io::{AudioBackend, AudioDevice, CpalBackend};

#[derive(Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    command: Option<DevicesCommand>,
}

#[derive(Subcommand)]
enum DevicesCommand {
    /// List all available audio devices
    List,

    /// Show default device information
    Info,
}

/// How a device would carry the composite.
fn route_hint(device: &AudioDevice) -> &'static str {
    if device.max_sample_rate >= MIN_MPX_RATE {
        "composite capable"
    } else {
        "network output only"
    }
}

fn print_device(idx: usize, device: &AudioDevice, note: &str) {
    println!(
        "  [{}] {} ({} Hz, up to {} Hz){}",
        idx, device.name, device.default_sample_rate, device.max_sample_rate, note
    );
}

pub fn run(args: DevicesArgs) -> anyhow::Result<()> {
    let backend = CpalBackend::new();

    match args.command.unwrap_or(DevicesCommand::List) {
        DevicesCommand::List => {
            let devices = backend.list_devices()?;
            if devices.is_empty() {
                println!("No audio devices found.");
                return Ok(());
            }

            println!("Available Audio Devices");
            println!("=======================\n");

            let inputs: Vec<_> = devices.iter().filter(|d| d.is_input).collect();
            if !inputs.is_empty() {
                println!("Input Devices:");
                for (idx, device) in inputs.iter().enumerate() {
                    let note = if device.is_output { " (also output)" } else { "" };
                    print_device(idx, device, note);
                }
                println!();
            }

            let outputs: Vec<_> = devices.iter().filter(|d| d.is_output).collect();
            if !outputs.is_empty() {
                println!("Output Devices:");
                for (idx, device) in outputs.iter().enumerate() {
                    print_device(idx, device, &format!(" - {}", route_hint(device)));
                }
                println!();
            }

            println!(
                "Total: {} input(s), {} output(s)",
                inputs.len(),
                outputs.len()
            );
            println!();
            println!("Tip: select devices by partial name:");
            println!("  fmpx run --input-device \"USB\" --output-device \"USB\"");
        }

        DevicesCommand::Info => {
            println!("Backend: {}\n", backend.name());
            match backend.default_input_device()? {
                Some(d) => println!("Default input:  {} ({} Hz)", d.name, d.default_sample_rate),
                None => println!("Default input:  none"),
            }
            match backend.default_output_device()? {
                Some(d) => println!(
                    "Default output: {} ({} Hz, {})",
                    d.name,
                    d.default_sample_rate,
                    route_hint(&d)
                ),
                None => println!("Default output: none"),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slow_devices_route_to_network() {
        let mut device = AudioDevice {
            name: "card".into(),
            is_input: true,
            is_output: true,
            default_sample_rate: 48_000,
            max_sample_rate: 96_000,
        };
        assert_eq!(route_hint(&device), "network output only");
        device.max_sample_rate = 192_000;
        assert_eq!(route_hint(&device), "composite capable");
    }
}
