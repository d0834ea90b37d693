//! Pluggable audio backend abstraction.
//!
//! The processing loop works on blocking, fixed-size block I/O: read exactly
//! one block, write exactly one block. [`AudioBackend`] hands out endpoints
//! with that shape, hiding whether the platform delivers audio through
//! callbacks (cpal) or something else entirely (the mock backend).
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────┐
//! │         ProcessingLoop           │
//! │  read_block → engine → write     │
//! └──────────────┬───────────────────┘
//!                │ via AudioStreamManager
//!                ▼
//! ┌──────────────────────────────────┐
//! │   InputHandle / OutputHandle     │
//! │  idempotent close, close on drop │
//! └──────────────┬───────────────────┘
//!                │ wraps Box<dyn InputStream / OutputStream>
//!        ┌───────┴────────┐
//!        ▼                ▼
//! ┌─────────────┐  ┌─────────────┐
//! │ CpalBackend │  │ MockBackend │
//! │  (devices)  │  │   (tests)   │
//! └─────────────┘  └─────────────┘
//! ```
//!
//! The trait is object-safe so the backend can be chosen at runtime
//! (`Box<dyn AudioBackend>`), and endpoints are `Send` so an opened pair can be
//! moved onto the processing thread.

use crate::{AudioDevice, Error, Result, StreamConfig};

/// Blocking capture endpoint.
pub trait InputStream: Send {
    /// Fill `block` completely, blocking until enough frames have arrived.
    fn read_block(&mut self, block: &mut [i16]) -> Result<()>;

    /// Stop capture and release the device. Called at most once.
    fn stop(&mut self) {}
}

/// Blocking playback endpoint.
pub trait OutputStream: Send {
    /// Queue all of `block`, blocking until the device has room for it.
    fn write_block(&mut self, block: &[i16]) -> Result<()>;

    /// Stop playback and release the device. Called at most once.
    fn stop(&mut self) {}
}

/// Pluggable audio backend trait.
pub trait AudioBackend: Send {
    /// Human-readable name of this backend (e.g., "cpal", "mock").
    fn name(&self) -> &str;

    /// List the devices this backend can open.
    fn list_devices(&self) -> Result<Vec<AudioDevice>>;

    /// Open and start a capture stream.
    fn open_input(&self, config: &StreamConfig) -> Result<Box<dyn InputStream>>;

    /// Open and start a playback stream.
    fn open_output(&self, config: &StreamConfig) -> Result<Box<dyn OutputStream>>;
}

/// Owned capture handle.
///
/// Closing is idempotent and also happens on drop. Reads on a closed handle
/// fail with [`Error::StreamClosed`].
#[derive(Default)]
pub struct InputHandle {
    stream: Option<Box<dyn InputStream>>,
}

impl InputHandle {
    /// Wrap an open stream.
    pub fn new(stream: Box<dyn InputStream>) -> Self {
        Self {
            stream: Some(stream),
        }
    }

    /// Handle that was never opened.
    pub fn closed() -> Self {
        Self::default()
    }

    /// Whether the handle still holds an open stream.
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Read one block.
    pub fn read_block(&mut self, block: &mut [i16]) -> Result<()> {
        self.stream
            .as_mut()
            .ok_or(Error::StreamClosed)?
            .read_block(block)
    }

    /// Stop and release the stream. No-op if already closed.
    pub fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
        }
    }
}

impl Drop for InputHandle {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for InputHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputHandle")
            .field("open", &self.is_open())
            .finish()
    }
}

/// Owned playback handle.
///
/// Closing is idempotent and also happens on drop. Writes on a closed handle
/// fail with [`Error::StreamClosed`].
#[derive(Default)]
pub struct OutputHandle {
    stream: Option<Box<dyn OutputStream>>,
}

impl OutputHandle {
    /// Wrap an open stream.
    pub fn new(stream: Box<dyn OutputStream>) -> Self {
        Self {
            stream: Some(stream),
        }
    }

    /// Handle that was never opened.
    pub fn closed() -> Self {
        Self::default()
    }

    /// Whether the handle still holds an open stream.
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Write one block.
    pub fn write_block(&mut self, block: &[i16]) -> Result<()> {
        self.stream
            .as_mut()
            .ok_or(Error::StreamClosed)?
            .write_block(block)
    }

    /// Stop and release the stream. No-op if already closed.
    pub fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
        }
    }
}

impl Drop for OutputHandle {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for OutputHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputHandle")
            .field("open", &self.is_open())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingInput(Arc<AtomicUsize>);

    impl InputStream for CountingInput {
        fn read_block(&mut self, block: &mut [i16]) -> Result<()> {
            block.fill(1);
            Ok(())
        }

        fn stop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_close_is_idempotent() {
        let stops = Arc::new(AtomicUsize::new(0));
        let mut handle = InputHandle::new(Box::new(CountingInput(Arc::clone(&stops))));
        assert!(handle.is_open());

        handle.close();
        handle.close();
        drop(handle);
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_closes() {
        let stops = Arc::new(AtomicUsize::new(0));
        drop(InputHandle::new(Box::new(CountingInput(Arc::clone(&stops)))));
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_closed_handles_reject_io() {
        let mut input = InputHandle::closed();
        let mut output = OutputHandle::closed();
        let mut block = [0i16; 4];
        assert!(matches!(input.read_block(&mut block), Err(Error::StreamClosed)));
        assert!(matches!(output.write_block(&block), Err(Error::StreamClosed)));
        input.close();
        output.close();
    }

    #[test]
    fn test_handle_debug() {
        let debug_str = format!("{:?}", OutputHandle::closed());
        assert!(debug_str.contains("OutputHandle"));
        assert!(debug_str.contains("false"));
    }
}
