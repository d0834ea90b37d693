//! The real-time read → transform → write cycle.

use crate::controller::CancellationFlag;
use crate::{AudioStreamManager, Result, StreamConfig};
use std::sync::Arc;
use tsunami_core::{RateControl, TsunamiEngine, divisor};

/// Counters for one processing session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Blocks read, processed and written.
    pub blocks: u64,
    /// Blocks whose expanded length had to be truncated or padded.
    pub conformed_blocks: u64,
    /// Divisor used for the most recent block (0 before the first block).
    pub last_divisor: usize,
}

/// One processing session over an opened [`AudioStreamManager`].
///
/// Each iteration checks the cancellation flag, then blocks on a device read,
/// samples the current target rate, runs the engine, and blocks on a device
/// write. The rate is read once per block; an update lands on the next block
/// at the latest.
pub struct ProcessingLoop {
    manager: AudioStreamManager,
    engine: TsunamiEngine,
    rate: Arc<RateControl>,
    cancel: CancellationFlag,
    native_rate: u32,
    input: Vec<i16>,
    output: Vec<i16>,
    stats: SessionStats,
}

impl ProcessingLoop {
    /// Prepare a session. `manager` should already be open.
    pub fn new(
        manager: AudioStreamManager,
        engine: TsunamiEngine,
        rate: Arc<RateControl>,
        cancel: CancellationFlag,
        config: &StreamConfig,
    ) -> Self {
        Self {
            manager,
            engine,
            rate,
            cancel,
            native_rate: config.sample_rate,
            input: vec![0; config.block_size],
            output: vec![0; config.block_size],
            stats: SessionStats::default(),
        }
    }

    /// Name of the backend the session runs on.
    pub fn backend_name(&self) -> &str {
        self.manager.backend_name()
    }

    /// Counters so far.
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Run until cancelled or until a stream fails.
    ///
    /// Both streams are closed before this returns, whichever way the session
    /// ended. Stream errors are returned as-is and never retried, except that
    /// a failure after a stop request counts as a normal stop.
    pub fn run(&mut self) -> Result<SessionStats> {
        tracing::info!(
            backend = self.manager.backend_name(),
            target_rate = self.rate.get(),
            "processing started"
        );

        let result = loop {
            if self.cancel.is_cancelled() {
                break Ok(());
            }
            if let Err(e) = self.cycle() {
                if self.cancel.is_cancelled() {
                    // stop arrived while the device was stalled
                    tracing::debug!(error = %e, "stream error after stop request");
                    break Ok(());
                }
                break Err(e);
            }
        };
        self.manager.close();

        match result {
            Ok(()) => {
                tracing::info!(
                    blocks = self.stats.blocks,
                    conformed = self.stats.conformed_blocks,
                    "processing stopped"
                );
                Ok(self.stats)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    blocks = self.stats.blocks,
                    "processing terminated"
                );
                Err(e)
            }
        }
    }

    /// Process exactly one block.
    pub fn cycle(&mut self) -> Result<()> {
        self.manager.read_block(&mut self.input)?;

        let d = divisor(self.native_rate, self.rate.get());
        if d != self.stats.last_divisor {
            tracing::debug!(divisor = d, previous = self.stats.last_divisor, "divisor changed");
        }

        let expanded = self.engine.process_block(&self.input, d, &mut self.output);
        self.manager.write_block(&self.output)?;

        self.stats.blocks += 1;
        self.stats.last_divisor = d;
        if expanded != self.output.len() {
            self.stats.conformed_blocks += 1;
        }
        Ok(())
    }

    /// Give the (closed) manager back.
    pub fn into_manager(self) -> AudioStreamManager {
        self.manager
    }
}
