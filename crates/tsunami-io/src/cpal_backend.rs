//! cpal-based audio backend implementation.
//!
//! cpal delivers audio through callbacks on its own real-time threads, while
//! the processing loop wants blocking block I/O. [`CpalBackend`] bridges the
//! two with bounded per-sample [`crossbeam_channel`] queues sized in frames:
//!
//! ```text
//!  mic ─► input callback ─try_send─► [queue] ─recv_timeout─► read_block
//! write_block ─send_timeout─► [queue] ─try_recv─► output callback ─► speaker
//! ```
//!
//! Callbacks never block and never allocate. Samples that do not fit in a full
//! input queue are dropped (one overrun per callback); an empty output queue
//! plays silence (one underrun per callback). The blocking side gives up after
//! [`StreamConfig::io_timeout`] so a dead device ends the session instead of
//! hanging it.

use crate::backend::{AudioBackend, InputStream, OutputStream};
use crate::devices::{Direction, device_name, find_device};
use crate::{AudioDevice, Error, Result, StreamConfig};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Host, Stream};
use crossbeam_channel::{Receiver, RecvTimeoutError, SendTimeoutError, Sender, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// Blocks of capture buffered between the input callback and `read_block`.
const INPUT_QUEUE_BLOCKS: usize = 8;

/// Blocks of playback buffered between `write_block` and the output callback.
const OUTPUT_QUEUE_BLOCKS: usize = 2;

/// cpal-based audio backend.
///
/// Holds a cpal [`Host`], the connection to the platform's audio system
/// (ALSA on Linux, CoreAudio on macOS, WASAPI on Windows).
pub struct CpalBackend {
    host: Host,
}

impl CpalBackend {
    /// Create a new cpal backend using the platform's default audio host.
    pub fn new() -> Self {
        let host = cpal::default_host();
        tracing::info!(host = host.id().name(), "cpal backend initialized");
        Self { host }
    }

    /// Check that the host has both a default input and a default output device.
    pub fn ensure_available(&self) -> Result<()> {
        if self.host.default_input_device().is_none() {
            return Err(Error::DeviceUnavailable("no default input device".into()));
        }
        if self.host.default_output_device().is_none() {
            return Err(Error::DeviceUnavailable("no default output device".into()));
        }
        Ok(())
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn cpal_config(config: &StreamConfig) -> cpal::StreamConfig {
    cpal::StreamConfig {
        channels: config.channels,
        sample_rate: config.sample_rate,
        buffer_size: cpal::BufferSize::Fixed(config.block_size as u32),
    }
}

impl AudioBackend for CpalBackend {
    fn name(&self) -> &'static str {
        "cpal"
    }

    fn list_devices(&self) -> Result<Vec<AudioDevice>> {
        // Uses cpal::default_host(), the same host this backend holds.
        crate::devices::list_devices()
    }

    fn open_input(&self, config: &StreamConfig) -> Result<Box<dyn InputStream>> {
        let device = find_device(&self.host, config.input_device.as_deref(), Direction::Input)?;
        let (tx, rx) = bounded::<i16>(queue_frames(config, INPUT_QUEUE_BLOCKS));
        let faulted = Arc::new(AtomicBool::new(false));
        let overruns = Arc::new(AtomicU64::new(0));

        let cb_overruns = Arc::clone(&overruns);
        let cb_faulted = Arc::clone(&faulted);
        let stream = device
            .build_input_stream(
                &cpal_config(config),
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    capture(data, &tx, &cb_overruns);
                },
                move |err| {
                    tracing::error!(error = %err, "input stream error");
                    cb_faulted.store(true, Ordering::Release);
                },
                None,
            )
            .map_err(|e| Error::DeviceUnavailable(e.to_string()))?;

        stream
            .play()
            .map_err(|e| Error::DeviceUnavailable(e.to_string()))?;
        tracing::info!(
            device = %device_name(&device).unwrap_or_default(),
            channels = config.channels,
            sample_rate = config.sample_rate,
            block_size = config.block_size,
            "input stream started"
        );

        Ok(Box::new(CpalInput {
            stream: Some(stream),
            rx,
            faulted,
            overruns,
            timeout: config.io_timeout,
        }))
    }

    fn open_output(&self, config: &StreamConfig) -> Result<Box<dyn OutputStream>> {
        let device = find_device(&self.host, config.output_device.as_deref(), Direction::Output)?;
        let (tx, rx) = bounded::<i16>(queue_frames(config, OUTPUT_QUEUE_BLOCKS));
        let faulted = Arc::new(AtomicBool::new(false));
        let underruns = Arc::new(AtomicU64::new(0));

        let cb_underruns = Arc::clone(&underruns);
        let cb_faulted = Arc::clone(&faulted);
        let stream = device
            .build_output_stream(
                &cpal_config(config),
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    play(data, &rx, &cb_underruns);
                },
                move |err| {
                    tracing::error!(error = %err, "output stream error");
                    cb_faulted.store(true, Ordering::Release);
                },
                None,
            )
            .map_err(|e| Error::DeviceUnavailable(e.to_string()))?;

        stream
            .play()
            .map_err(|e| Error::DeviceUnavailable(e.to_string()))?;
        tracing::info!(
            device = %device_name(&device).unwrap_or_default(),
            channels = config.channels,
            sample_rate = config.sample_rate,
            block_size = config.block_size,
            "output stream started"
        );

        Ok(Box::new(CpalOutput {
            stream: Some(stream),
            tx,
            faulted,
            underruns,
            timeout: config.io_timeout,
        }))
    }
}

fn queue_frames(config: &StreamConfig, blocks: usize) -> usize {
    config.block_size.max(1) * usize::from(config.channels.max(1)) * blocks
}

/// Input callback body: queue every sample, counting one overrun per
/// callback that could not queue them all.
fn capture(data: &[i16], tx: &Sender<i16>, overruns: &AtomicU64) {
    let mut dropped = false;
    for &sample in data {
        if tx.try_send(sample).is_err() {
            dropped = true;
        }
    }
    if dropped {
        overruns.fetch_add(1, Ordering::Relaxed);
    }
}

/// Output callback body: play queued samples, filling any shortfall with
/// silence and counting one underrun per starved callback.
fn play(data: &mut [i16], rx: &Receiver<i16>, underruns: &AtomicU64) {
    let mut starved = false;
    for slot in data.iter_mut() {
        *slot = rx.try_recv().unwrap_or_else(|_| {
            starved = true;
            0
        });
    }
    if starved {
        underruns.fetch_add(1, Ordering::Relaxed);
    }
}

fn pause_stream(stream: Stream, direction: &str) {
    if let Err(e) = stream.pause() {
        tracing::debug!(direction, error = %e, "pause failed while closing");
    }
}

struct CpalInput {
    stream: Option<Stream>,
    rx: Receiver<i16>,
    faulted: Arc<AtomicBool>,
    overruns: Arc<AtomicU64>,
    timeout: Duration,
}

impl InputStream for CpalInput {
    fn read_block(&mut self, block: &mut [i16]) -> Result<()> {
        for slot in block.iter_mut() {
            if let Ok(sample) = self.rx.try_recv() {
                *slot = sample;
                continue;
            }
            if self.faulted.load(Ordering::Acquire) {
                return Err(Error::StreamIo("input device reported an error".into()));
            }
            *slot = match self.rx.recv_timeout(self.timeout) {
                Ok(sample) => sample,
                Err(RecvTimeoutError::Timeout) => {
                    return Err(Error::StreamIo(format!(
                        "no input received for {:?}",
                        self.timeout
                    )));
                }
                Err(RecvTimeoutError::Disconnected) => return Err(Error::StreamClosed),
            };
        }
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            pause_stream(stream, "input");
            tracing::info!(
                overruns = self.overruns.load(Ordering::Relaxed),
                "input stream closed"
            );
        }
    }
}

struct CpalOutput {
    stream: Option<Stream>,
    tx: Sender<i16>,
    faulted: Arc<AtomicBool>,
    underruns: Arc<AtomicU64>,
    timeout: Duration,
}

impl OutputStream for CpalOutput {
    fn write_block(&mut self, block: &[i16]) -> Result<()> {
        if self.faulted.load(Ordering::Acquire) {
            return Err(Error::StreamIo("output device reported an error".into()));
        }
        for &sample in block {
            match self.tx.send_timeout(sample, self.timeout) {
                Ok(()) => {}
                Err(SendTimeoutError::Timeout(_)) => {
                    return Err(Error::StreamIo(format!(
                        "output device accepted no data for {:?}",
                        self.timeout
                    )));
                }
                Err(SendTimeoutError::Disconnected(_)) => return Err(Error::StreamClosed),
            }
        }
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            pause_stream(stream, "output");
            tracing::info!(
                underruns = self.underruns.load(Ordering::Relaxed),
                "output stream closed"
            );
        }
    }
}
