//! Audio device listing command.

use super::BackendKind;
use clap::{Args, Subcommand};
use tsunami_io::{AudioBackend, AudioDevice, MockBackend, default_device, list_devices};

#[derive(Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    command: Option<DevicesCommand>,

    /// Audio backend to query
    #[arg(long, value_enum, default_value_t = BackendKind::Cpal, global = true)]
    backend: BackendKind,
}

#[derive(Subcommand)]
enum DevicesCommand {
    /// List all available audio devices
    List,

    /// Show default device information
    Info,
}

pub fn run(args: DevicesArgs) -> anyhow::Result<()> {
    match args.command.unwrap_or(DevicesCommand::List) {
        DevicesCommand::List => {
            let devices = match args.backend {
                BackendKind::Cpal => list_devices()?,
                BackendKind::Mock => MockBackend::new().list_devices()?,
            };

            if devices.is_empty() {
                println!("No audio devices found.");
                return Ok(());
            }

            println!("Available Audio Devices");
            println!("=======================\n");

            let inputs: Vec<_> = devices.iter().filter(|d| d.is_input).collect();
            let outputs: Vec<_> = devices.iter().filter(|d| d.is_output).collect();
            print_section("Input Devices", &inputs);
            print_section("Output Devices", &outputs);
            println!(
                "Total: {} input(s), {} output(s)",
                inputs.len(),
                outputs.len()
            );
            println!();
            println!("Tip: Use device index or partial name with --input/--output:");
            println!("  tsunami run --input 0 --output 0");
            println!("  tsunami run --input \"USB\" --output \"USB\" --rate 8000");
        }

        DevicesCommand::Info => {
            let (input, output) = match args.backend {
                BackendKind::Cpal => default_device()?,
                BackendKind::Mock => {
                    let mock = MockBackend::new().list_devices()?.into_iter().next();
                    (mock.clone(), mock)
                }
            };

            println!("Default Audio Devices");
            println!("=====================\n");
            print_default("Input", input.as_ref());
            println!();
            print_default("Output", output.as_ref());
        }
    }

    Ok(())
}

fn print_section(title: &str, devices: &[&AudioDevice]) {
    if devices.is_empty() {
        return;
    }
    println!("{title}:");
    for (idx, device) in devices.iter().enumerate() {
        let duplex = if device.is_input && device.is_output {
            " (duplex)"
        } else {
            ""
        };
        println!(
            "  [{idx}] {} ({} Hz){duplex}",
            device.name, device.default_sample_rate
        );
    }
    println!();
}

fn print_default(role: &str, device: Option<&AudioDevice>) {
    match device {
        Some(device) => {
            println!("Default {role}: {}", device.name);
            println!("  Sample Rate: {} Hz", device.default_sample_rate);
        }
        None => println!("Default {role}: None"),
    }
}
