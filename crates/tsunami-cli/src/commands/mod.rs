//! CLI command implementations.

pub mod console;
pub mod devices;
pub mod run;

use anyhow::Context;
use clap::ValueEnum;
use tsunami_io::{AudioBackend, CpalBackend, MockBackend, StreamConfig};

/// Audio backend selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// System audio through cpal
    Cpal,
    /// Generated test signal, output discarded
    Mock,
}

/// Construct the selected backend, checking that a real host has devices.
pub fn create_backend(
    kind: BackendKind,
    config: &StreamConfig,
) -> anyhow::Result<Box<dyn AudioBackend>> {
    match kind {
        BackendKind::Cpal => {
            let backend = CpalBackend::new();
            backend
                .ensure_available()
                .context("audio subsystem unavailable")?;
            Ok(Box::new(backend))
        }
        BackendKind::Mock => Ok(Box::new(MockBackend::realtime(config))),
    }
}
