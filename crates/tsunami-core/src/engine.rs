//! The per-block effect chain.
//!
//! [`TsunamiEngine`] runs one captured block through
//! decimate → shape → repeat-expand → symmetric clip → conform, writing into a
//! caller-provided output block. Scratch buffers keep their capacity between
//! blocks, so steady-state processing does not allocate.
//!
//! # Conforming the output length
//!
//! Expansion produces `d * ceil(len / d)` samples, which overshoots the input
//! length whenever the divisor does not divide it (1026 for 1024 at d = 3).
//! The engine always writes exactly `output.len()` samples: the overshoot is
//! truncated and any shortfall is filled with silence. Each device write then
//! carries as many frames as the matching read, and input and output stay
//! rate-locked.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::resample::{decimate_into, repeat_expand_into};
use crate::sample::clip_symmetric;
use crate::shaper::WaveShaper;

/// Block processor for the tsunami chain.
#[derive(Debug, Clone)]
pub struct TsunamiEngine {
    shaper: WaveShaper,
    block_size: usize,
    low: Vec<i16>,
    high: Vec<i16>,
}

impl TsunamiEngine {
    /// Create an engine for blocks of `block_size` frames using the default shaper.
    pub fn new(block_size: usize) -> Self {
        Self::with_shaper(block_size, WaveShaper::new())
    }

    /// Create an engine with an explicit shaper.
    pub fn with_shaper(block_size: usize, shaper: WaveShaper) -> Self {
        Self {
            shaper,
            block_size,
            low: Vec::with_capacity(block_size),
            // Grows to the largest expansion seen and keeps that capacity.
            high: Vec::with_capacity(block_size * 2),
        }
    }

    /// Block size this engine was sized for.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// The shaper in use.
    pub fn shaper(&self) -> &WaveShaper {
        &self.shaper
    }

    /// Process one block.
    ///
    /// `divisor` is clamped to at least 1. Returns the expanded length before
    /// conforming, which differs from `output.len()` when samples were
    /// truncated or padded.
    pub fn process_block(&mut self, input: &[i16], divisor: usize, output: &mut [i16]) -> usize {
        let d = divisor.max(1);
        decimate_into(input, d, &mut self.low);
        self.shaper.shape_in_place(&mut self.low);
        repeat_expand_into(&self.low, d, &mut self.high);
        clip_symmetric(&mut self.high);

        let expanded = self.high.len();
        let copied = expanded.min(output.len());
        output[..copied].copy_from_slice(&self.high[..copied]);
        output[copied..].fill(0);

        #[cfg(feature = "tracing")]
        {
            if expanded != output.len() {
                tracing::trace!(expanded, block = output.len(), divisor = d, "conformed block");
            }
        }

        expanded
    }
}

impl Default for TsunamiEngine {
    fn default() -> Self {
        Self::new(crate::BLOCK_SIZE)
    }
}
