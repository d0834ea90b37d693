//! Tsunami Core - block DSP for the lo-fi pass-through processor
//!
//! This crate holds everything the real-time path computes, with no audio I/O
//! and no allocation once the engine's scratch buffers are warm.
//!
//! # Building Blocks
//!
//! - [`RateControl`] - Lock-free, range-checked target rate shared between the
//!   control thread and the processing thread
//! - [`resample`] - Integer-ratio decimation and repeat-expansion
//! - [`WaveShaper`] / [`ShapeRule`] - The "tsunami" per-index gain pattern
//! - [`sample`] - 16-bit clipping helpers
//! - [`TsunamiEngine`] - The full per-block chain: decimate, shape, expand,
//!   clip, conform to the block size
//!
//! # Fixed Format
//!
//! The device side of the pipeline never changes rate. Only the internal
//! divisor between [`NATIVE_RATE`] and the operator's target rate varies.
//!
//! | Constant | Value |
//! |----------|-------|
//! | [`NATIVE_RATE`] | 48000 Hz |
//! | [`CHANNELS`] | 1 (mono) |
//! | [`BLOCK_SIZE`] | 1024 frames |
//! | Sample format | signed 16-bit linear PCM |
//!
//! # no_std Support
//!
//! Disable the default `std` feature to build against `alloc` only:
//!
//! ```toml
//! [dependencies]
//! tsunami-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use tsunami_core::{BLOCK_SIZE, RateControl, TsunamiEngine};
//!
//! let rate = RateControl::new(16_000);
//! let mut engine = TsunamiEngine::new(BLOCK_SIZE);
//!
//! let input = vec![1000i16; BLOCK_SIZE];
//! let mut output = vec![0i16; BLOCK_SIZE];
//! let expanded = engine.process_block(&input, rate.divisor(), &mut output);
//!
//! assert_eq!(expanded, 1026);
//! assert_eq!(output.len(), BLOCK_SIZE);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod engine;
pub mod rate;
pub mod resample;
pub mod sample;
pub mod shaper;

pub use engine::TsunamiEngine;
pub use rate::{DEFAULT_TARGET_RATE, InvalidRate, MAX_TARGET_RATE, MIN_TARGET_RATE, RateControl};
pub use resample::{decimate, decimated_len, divisor, repeat_expand};
pub use sample::{OUTPUT_PEAK, clip_symmetric, clip_to_i16};
pub use shaper::{ParseShapeRuleError, ShapeRule, WaveShaper};

/// Sample rate the audio devices are opened at, in Hz.
pub const NATIVE_RATE: u32 = 48_000;

/// Channel count of both device streams (mono).
pub const CHANNELS: u16 = 1;

/// Frames exchanged with a device per read or write.
pub const BLOCK_SIZE: usize = 1024;
