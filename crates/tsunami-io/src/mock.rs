//! Deterministic backend for tests and headless runs.
//!
//! [`MockBackend`] generates its capture signal from the absolute sample index,
//! can simulate device latency with a per-read delay, and can inject open or
//! read failures. A shared [`MockProbe`] exposes what happened: how many
//! streams are open right now, how many blocks moved, and the last block
//! written.

use crate::backend::{AudioBackend, InputStream, OutputStream};
use crate::{AudioDevice, Error, Result, StreamConfig};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tsunami_core::NATIVE_RATE;

/// Capture signal: sample value for an absolute sample index.
pub type SignalFn = fn(u64) -> i16;

/// 440 Hz sine at half scale.
pub fn sine_440(n: u64) -> i16 {
    let phase = std::f64::consts::TAU * 440.0 * n as f64 / f64::from(NATIVE_RATE);
    (phase.sin() * 16_384.0) as i16
}

#[derive(Debug, Default)]
struct ProbeState {
    open_inputs: AtomicUsize,
    open_outputs: AtomicUsize,
    inputs_opened: AtomicUsize,
    blocks_read: AtomicU64,
    blocks_written: AtomicU64,
    last_written: Mutex<Vec<i16>>,
}

/// Observation point shared between a [`MockBackend`] and the test.
#[derive(Debug, Clone, Default)]
pub struct MockProbe {
    state: Arc<ProbeState>,
}

impl MockProbe {
    /// Input streams currently open.
    pub fn open_inputs(&self) -> usize {
        self.state.open_inputs.load(Ordering::SeqCst)
    }

    /// Output streams currently open.
    pub fn open_outputs(&self) -> usize {
        self.state.open_outputs.load(Ordering::SeqCst)
    }

    /// Input streams opened over the backend's lifetime.
    pub fn inputs_opened(&self) -> usize {
        self.state.inputs_opened.load(Ordering::SeqCst)
    }

    /// Blocks delivered by all input streams.
    pub fn blocks_read(&self) -> u64 {
        self.state.blocks_read.load(Ordering::SeqCst)
    }

    /// Blocks accepted by all output streams.
    pub fn blocks_written(&self) -> u64 {
        self.state.blocks_written.load(Ordering::SeqCst)
    }

    /// Copy of the most recent block written.
    pub fn last_written(&self) -> Vec<i16> {
        self.state
            .last_written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Deterministic audio backend.
#[derive(Debug, Clone)]
pub struct MockBackend {
    probe: MockProbe,
    signal: SignalFn,
    read_delay: Duration,
    fail_open: bool,
    fail_read_after: Option<u64>,
}

impl MockBackend {
    /// Backend producing [`sine_440`] with a 1 ms read delay.
    pub fn new() -> Self {
        Self {
            probe: MockProbe::default(),
            signal: sine_440,
            read_delay: Duration::from_millis(1),
            fail_open: false,
            fail_read_after: None,
        }
    }

    /// Backend that paces reads like a real device at the configured rate.
    pub fn realtime(config: &StreamConfig) -> Self {
        Self::new().with_read_delay(config.block_duration())
    }

    /// Use a different capture signal.
    pub fn with_signal(mut self, signal: SignalFn) -> Self {
        self.signal = signal;
        self
    }

    /// Sleep this long inside every `read_block`.
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = delay;
        self
    }

    /// Make every open fail with [`Error::DeviceUnavailable`].
    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// Make reads fail with [`Error::StreamIo`] once `blocks` blocks were read
    /// from a stream.
    pub fn failing_read_after(mut self, blocks: u64) -> Self {
        self.fail_read_after = Some(blocks);
        self
    }

    /// The probe observing this backend.
    pub fn probe(&self) -> MockProbe {
        self.probe.clone()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn list_devices(&self) -> Result<Vec<AudioDevice>> {
        Ok(vec![AudioDevice {
            name: "Mock Duplex".to_string(),
            is_input: true,
            is_output: true,
            default_sample_rate: NATIVE_RATE,
        }])
    }

    fn open_input(&self, _config: &StreamConfig) -> Result<Box<dyn InputStream>> {
        if self.fail_open {
            return Err(Error::DeviceUnavailable("mock input busy".into()));
        }
        self.probe.state.open_inputs.fetch_add(1, Ordering::SeqCst);
        self.probe.state.inputs_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockInput {
            probe: self.probe.clone(),
            signal: self.signal,
            read_delay: self.read_delay,
            fail_read_after: self.fail_read_after,
            position: 0,
            blocks: 0,
        }))
    }

    fn open_output(&self, _config: &StreamConfig) -> Result<Box<dyn OutputStream>> {
        if self.fail_open {
            return Err(Error::DeviceUnavailable("mock output busy".into()));
        }
        self.probe.state.open_outputs.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockOutput {
            probe: self.probe.clone(),
        }))
    }
}

struct MockInput {
    probe: MockProbe,
    signal: SignalFn,
    read_delay: Duration,
    fail_read_after: Option<u64>,
    position: u64,
    blocks: u64,
}

impl InputStream for MockInput {
    fn read_block(&mut self, block: &mut [i16]) -> Result<()> {
        if !self.read_delay.is_zero() {
            std::thread::sleep(self.read_delay);
        }
        if self.fail_read_after.is_some_and(|n| self.blocks >= n) {
            return Err(Error::StreamIo("mock input unplugged".into()));
        }
        for sample in block.iter_mut() {
            *sample = (self.signal)(self.position);
            self.position += 1;
        }
        self.blocks += 1;
        self.probe.state.blocks_read.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) {
        self.probe.state.open_inputs.fetch_sub(1, Ordering::SeqCst);
    }
}

struct MockOutput {
    probe: MockProbe,
}

impl OutputStream for MockOutput {
    fn write_block(&mut self, block: &[i16]) -> Result<()> {
        let mut last = self
            .probe
            .state
            .last_written
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        last.clear();
        last.extend_from_slice(block);
        self.probe.state.blocks_written.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) {
        self.probe.state.open_outputs.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_is_continuous_across_blocks() {
        let backend = MockBackend::new()
            .with_signal(|n| n as i16)
            .with_read_delay(Duration::ZERO);
        let mut input = backend.open_input(&StreamConfig::default()).unwrap();

        let mut block = [0i16; 4];
        input.read_block(&mut block).unwrap();
        assert_eq!(block, [0, 1, 2, 3]);
        input.read_block(&mut block).unwrap();
        assert_eq!(block, [4, 5, 6, 7]);
        assert_eq!(backend.probe().blocks_read(), 2);
    }

    #[test]
    fn test_probe_tracks_open_streams() {
        let backend = MockBackend::new();
        let probe = backend.probe();
        let config = StreamConfig::default();

        let mut input = backend.open_input(&config).unwrap();
        let mut output = backend.open_output(&config).unwrap();
        assert_eq!((probe.open_inputs(), probe.open_outputs()), (1, 1));

        output.write_block(&[1, 2, 3]).unwrap();
        assert_eq!(probe.last_written(), vec![1, 2, 3]);

        input.stop();
        output.stop();
        assert_eq!((probe.open_inputs(), probe.open_outputs()), (0, 0));
    }

    #[test]
    fn test_injected_failures() {
        let config = StreamConfig::default();
        assert!(matches!(
            MockBackend::new().failing_open().open_input(&config),
            Err(Error::DeviceUnavailable(_))
        ));

        let backend = MockBackend::new()
            .with_read_delay(Duration::ZERO)
            .failing_read_after(1);
        let mut input = backend.open_input(&config).unwrap();
        let mut block = [0i16; 8];
        assert!(input.read_block(&mut block).is_ok());
        assert!(matches!(input.read_block(&mut block), Err(Error::StreamIo(_))));
    }
}
