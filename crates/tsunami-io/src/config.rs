//! Stream configuration.

use std::time::Duration;
use tsunami_core::{BLOCK_SIZE, CHANNELS, NATIVE_RATE};

/// Stream configuration shared by both directions.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Device sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Frames per read/write.
    pub block_size: usize,
    /// Input device (index, exact or partial name; default device if `None`).
    pub input_device: Option<String>,
    /// Output device (index, exact or partial name; default device if `None`).
    pub output_device: Option<String>,
    /// How long a blocking read or write may wait before the stream is
    /// considered stalled.
    pub io_timeout: Duration,
}

impl StreamConfig {
    /// Duration of one block at the configured rate.
    pub fn block_duration(&self) -> Duration {
        Duration::from_secs_f64(self.block_size as f64 / f64::from(self.sample_rate.max(1)))
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: NATIVE_RATE,
            channels: CHANNELS,
            block_size: BLOCK_SIZE,
            input_device: None,
            output_device: None,
            io_timeout: Duration::from_secs(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StreamConfig::default();
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.channels, 1);
        assert_eq!(config.block_size, 1024);
        assert!(config.input_device.is_none());
        assert!(config.output_device.is_none());
    }

    #[test]
    fn test_block_duration() {
        let config = StreamConfig::default();
        let ms = config.block_duration().as_secs_f64() * 1000.0;
        assert!((ms - 21.333).abs() < 0.01, "got {ms}");
    }
}
