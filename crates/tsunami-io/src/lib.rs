//! Audio I/O and real-time processing for the tsunami pass-through processor.
//!
//! This crate provides:
//!
//! - **Backends**: the [`AudioBackend`] trait with a cpal implementation
//!   ([`CpalBackend`]) and a deterministic one for tests ([`MockBackend`])
//! - **Stream lifecycle**: [`AudioStreamManager`], sole owner of the open
//!   input/output handles
//! - **Processing**: [`ProcessingLoop`], the blocking read → transform → write
//!   cycle that runs on its own thread
//! - **Control**: [`Controller`], the start / stop / set-rate command interface
//!   a control surface drives
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tsunami_io::{Controller, CpalBackend, StreamConfig};
//!
//! let mut controller = Controller::new(Box::new(CpalBackend::new()), StreamConfig::default());
//! controller.start()?;
//! controller.set_rate(8000)?;
//! // ...
//! controller.shutdown()?;
//! ```

pub mod backend;
mod config;
mod controller;
pub mod cpal_backend;
mod devices;
mod manager;
pub mod mock;
mod processing;

pub use backend::{AudioBackend, InputHandle, InputStream, OutputHandle, OutputStream};
pub use config::StreamConfig;
pub use controller::{CancellationFlag, Controller, LoopState, SessionEvent};
pub use cpal_backend::CpalBackend;
pub use devices::{AudioDevice, default_device, list_devices};
pub use manager::AudioStreamManager;
pub use mock::{MockBackend, MockProbe};
pub use processing::{ProcessingLoop, SessionStats};

/// Error types for audio I/O and session control.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A stream could not be opened (device busy, permissions, missing hardware).
    #[error("Audio device unavailable: {0}")]
    DeviceUnavailable(String),

    /// No audio device available on the system.
    #[error("No audio device available")]
    NoDevice,

    /// The requested audio device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// A read or write failed mid-session.
    #[error("Audio stream I/O error: {0}")]
    StreamIo(String),

    /// A read or write was attempted on a closed handle.
    #[error("Audio stream is closed")]
    StreamClosed,

    /// A rate update outside the accepted range.
    #[error(transparent)]
    InvalidRate(#[from] tsunami_core::InvalidRate),

    /// The processing thread could not be started or did not exit cleanly.
    #[error("Processing thread error: {0}")]
    Worker(String),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
