//! Interactive pass-through session.
//!
//! Console lines come from a stdin reader thread and Ctrl+C from a signal
//! handler; both feed one channel that the main thread selects on together
//! with the controller's session events.

use super::console::{ControlCommand, HELP, parse_command};
use super::{BackendKind, create_backend};
use anyhow::Context;
use clap::Args;
use crossbeam_channel::{Receiver, Sender, select, unbounded};
use std::io::BufRead;
use std::thread;
use tsunami_core::{DEFAULT_TARGET_RATE, ShapeRule, WaveShaper};
use tsunami_io::{Controller, Error, LoopState, SessionEvent, StreamConfig};

#[derive(Args)]
pub struct RunArgs {
    /// Initial target sample rate in Hz (10-48000)
    #[arg(short, long, default_value_t = i64::from(DEFAULT_TARGET_RATE), allow_hyphen_values = true)]
    rate: i64,

    /// Input device (index or name)
    #[arg(long)]
    input: Option<String>,

    /// Output device (index or name)
    #[arg(long)]
    output: Option<String>,

    /// Gain rule as MODULUS:RESIDUE:GAIN (samples whose block index mod
    /// MODULUS equals RESIDUE are multiplied by GAIN)
    #[arg(long, default_value_t = ShapeRule::TSUNAMI)]
    rule: ShapeRule,

    /// Audio backend
    #[arg(long, value_enum, default_value_t = BackendKind::Cpal)]
    backend: BackendKind,

    /// Start processing right away
    #[arg(long)]
    autostart: bool,
}

/// Something for the console loop to react to.
enum ConsoleInput {
    Line(String),
    Eof,
    Interrupt,
}

pub fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = StreamConfig {
        input_device: args.input.clone(),
        output_device: args.output.clone(),
        ..StreamConfig::default()
    };

    let backend = create_backend(args.backend, &config)?;
    let mut controller =
        Controller::new(backend, config).with_shaper(WaveShaper::with_rule(args.rule));
    controller
        .set_rate(args.rate)
        .context("invalid --rate")?;

    let (tx, rx) = unbounded();
    spawn_stdin_reader(tx.clone())?;
    ctrlc::set_handler(move || {
        let _ = tx.send(ConsoleInput::Interrupt);
    })
    .context("failed to install Ctrl+C handler")?;

    println!("Tsunami lo-fi pass-through");
    println!("==========================");
    println!("Backend: {:?}", args.backend);
    println!("Target rate: {} Hz", controller.target_rate());
    if args.rule.is_reachable() {
        println!("Gain rule: {}", args.rule);
    } else {
        println!("Gain rule: {} (never matches, samples pass unchanged)", args.rule);
    }
    println!("Type 'help' for commands.");
    println!();

    if args.autostart {
        dispatch(&mut controller, ControlCommand::Start);
    }

    let events = controller.events();
    console_loop(&mut controller, &rx, &events);

    controller.shutdown().context("shutdown failed")?;
    while let Ok(event) = events.try_recv() {
        report(event);
    }
    println!("Bye.");
    Ok(())
}

fn spawn_stdin_reader(tx: Sender<ConsoleInput>) -> anyhow::Result<()> {
    thread::Builder::new()
        .name("tsunami-stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(ConsoleInput::Line(line)).is_err() {
                    return;
                }
            }
            let _ = tx.send(ConsoleInput::Eof);
        })
        .context("failed to spawn console reader")?;
    Ok(())
}

fn console_loop(
    controller: &mut Controller,
    input: &Receiver<ConsoleInput>,
    events: &Receiver<SessionEvent>,
) {
    loop {
        select! {
            recv(input) -> msg => match msg.unwrap_or(ConsoleInput::Eof) {
                ConsoleInput::Line(line) => match parse_command(&line) {
                    Ok(Some(command)) => {
                        if !dispatch(controller, command) {
                            return;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => println!("Warning: {e}"),
                },
                ConsoleInput::Eof => {
                    tracing::debug!("console input closed");
                    return;
                }
                ConsoleInput::Interrupt => {
                    println!("\nStopping...");
                    return;
                }
            },
            recv(events) -> event => {
                if let Ok(event) = event {
                    report(event);
                }
            }
        }
    }
}

/// Apply one command. Returns `false` when the console should exit.
fn dispatch(controller: &mut Controller, command: ControlCommand) -> bool {
    match command {
        ControlCommand::Start => {
            if controller.state() == LoopState::Running && !controller.stop_pending() {
                println!("Already running.");
            } else if let Err(e) = controller.start() {
                println!("Error: could not start: {e}");
            }
        }
        ControlCommand::Stop => {
            if controller.state() == LoopState::Idle {
                println!("Not running.");
            } else if controller.stop_pending() {
                println!("Already stopping.");
            } else {
                controller.stop();
            }
        }
        ControlCommand::SetRate(rate) => match controller.set_rate(rate) {
            Ok(()) => println!(
                "Target rate: {} Hz (divisor {})",
                controller.target_rate(),
                controller.rate_control().divisor()
            ),
            Err(Error::InvalidRate(e)) => println!(
                "Warning: {e}; keeping {} Hz",
                controller.target_rate()
            ),
            Err(e) => println!("Error: {e}"),
        },
        ControlCommand::Status => {
            let state = match controller.state() {
                LoopState::Idle => "idle",
                LoopState::Running => "running",
            };
            println!(
                "State: {state}, target rate {} Hz, divisor {}",
                controller.target_rate(),
                controller.rate_control().divisor()
            );
        }
        ControlCommand::Help => println!("{HELP}"),
        ControlCommand::Quit => return false,
    }
    true
}

fn report(event: SessionEvent) {
    match event {
        SessionEvent::Started { backend } => println!("Processing started ({backend})."),
        SessionEvent::Stopped(stats) => println!(
            "Processing stopped after {} blocks ({} conformed).",
            stats.blocks, stats.conformed_blocks
        ),
        SessionEvent::Terminated { error, stats } => println!(
            "Error: processing terminated after {} blocks: {error}",
            stats.blocks
        ),
    }
}
