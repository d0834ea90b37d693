//! Ownership of the open device streams.

use crate::backend::{AudioBackend, InputHandle, OutputHandle};
use crate::{Result, StreamConfig};

/// Sole owner of the input and output stream handles.
///
/// The handles never leave the manager; the processing loop goes through
/// [`read_block`](Self::read_block) and [`write_block`](Self::write_block).
/// The manager is moved onto the processing thread for the duration of a
/// session and handed back when the session ends, so only one thread ever
/// touches the streams.
pub struct AudioStreamManager {
    backend: Box<dyn AudioBackend>,
    input: InputHandle,
    output: OutputHandle,
}

impl AudioStreamManager {
    /// Create a manager with no open streams.
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        Self {
            backend,
            input: InputHandle::closed(),
            output: OutputHandle::closed(),
        }
    }

    /// Name of the backend in use.
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Open input and output at the configured rate, closing any open pair first.
    ///
    /// If the output cannot be opened the freshly opened input is closed again,
    /// so a failed open leaves nothing behind.
    pub fn open(&mut self, config: &StreamConfig) -> Result<()> {
        self.close();

        let input = self.backend.open_input(config)?;
        let mut input = InputHandle::new(input);
        let output = match self.backend.open_output(config) {
            Ok(output) => OutputHandle::new(output),
            Err(e) => {
                input.close();
                return Err(e);
            }
        };

        self.input = input;
        self.output = output;
        tracing::debug!(
            backend = self.backend.name(),
            sample_rate = config.sample_rate,
            channels = config.channels,
            block_size = config.block_size,
            "streams opened"
        );
        Ok(())
    }

    /// Whether both streams are open.
    pub fn is_open(&self) -> bool {
        self.input.is_open() && self.output.is_open()
    }

    /// Read one block from the input stream.
    pub fn read_block(&mut self, block: &mut [i16]) -> Result<()> {
        self.input.read_block(block)
    }

    /// Write one block to the output stream.
    pub fn write_block(&mut self, block: &[i16]) -> Result<()> {
        self.output.write_block(block)
    }

    /// Stop and release both streams. Safe to call repeatedly or before any open.
    pub fn close(&mut self) {
        let was_open = self.input.is_open() || self.output.is_open();
        self.input.close();
        self.output.close();
        if was_open {
            tracing::debug!(backend = self.backend.name(), "streams closed");
        }
    }
}

impl Drop for AudioStreamManager {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for AudioStreamManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioStreamManager")
            .field("backend", &self.backend.name())
            .field("input", &self.input)
            .field("output", &self.output)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::mock::MockBackend;

    #[test]
    fn test_close_before_open_is_noop() {
        let mut manager = AudioStreamManager::new(Box::new(MockBackend::new()));
        manager.close();
        manager.close();
        assert!(!manager.is_open());
    }

    #[test]
    fn test_reopen_closes_previous_pair() {
        let backend = MockBackend::new();
        let probe = backend.probe();
        let mut manager = AudioStreamManager::new(Box::new(backend));
        let config = StreamConfig::default();

        manager.open(&config).unwrap();
        manager.open(&config).unwrap();
        assert_eq!(probe.inputs_opened(), 2);
        assert_eq!((probe.open_inputs(), probe.open_outputs()), (1, 1));

        drop(manager);
        assert_eq!((probe.open_inputs(), probe.open_outputs()), (0, 0));
    }

    #[test]
    fn test_open_failure_is_reported() {
        let mut manager = AudioStreamManager::new(Box::new(MockBackend::new().failing_open()));
        let err = manager.open(&StreamConfig::default()).unwrap_err();
        assert!(matches!(err, Error::DeviceUnavailable(_)));
        assert!(!manager.is_open());
    }

    #[test]
    fn test_io_after_close_fails() {
        let mut manager = AudioStreamManager::new(Box::new(MockBackend::new()));
        manager.open(&StreamConfig::default()).unwrap();
        manager.close();

        let mut block = [0i16; 16];
        assert!(matches!(manager.read_block(&mut block), Err(Error::StreamClosed)));
        assert!(matches!(manager.write_block(&block), Err(Error::StreamClosed)));
    }
}
