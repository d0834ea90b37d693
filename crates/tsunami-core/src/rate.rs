//! Operator-controlled target rate shared across threads.
//!
//! [`RateControl`] is written by the control thread and read by the processing
//! thread once per block. The value fits in a single `AtomicU32`, so there is
//! no lock and the reader can never observe a torn value.
//!
//! Updates outside [`MIN_TARGET_RATE`]..=[`MAX_TARGET_RATE`] are rejected with
//! [`InvalidRate`] and leave the stored value untouched. Only the constructor
//! clamps, so a bad default can never leak into the processing thread.

use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::NATIVE_RATE;
use crate::resample;

/// Lowest accepted target rate in Hz.
pub const MIN_TARGET_RATE: u32 = 10;

/// Highest accepted target rate in Hz (the native device rate).
pub const MAX_TARGET_RATE: u32 = NATIVE_RATE;

/// Target rate used when nothing else is configured.
pub const DEFAULT_TARGET_RATE: u32 = 16_000;

/// A rate update that fell outside the accepted range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidRate {
    /// The value the caller asked for.
    pub requested: i64,
}

impl fmt::Display for InvalidRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "target rate {} Hz is outside {}..={} Hz",
            self.requested, MIN_TARGET_RATE, MAX_TARGET_RATE
        )
    }
}

impl core::error::Error for InvalidRate {}

/// Thread-safe target rate.
///
/// Control thread writes, processing thread reads. Share it with `Arc`.
#[derive(Debug)]
pub struct RateControl {
    rate: AtomicU32,
}

impl RateControl {
    /// Create a rate control, clamping `initial` into the accepted range.
    pub fn new(initial: u32) -> Self {
        Self {
            rate: AtomicU32::new(initial.clamp(MIN_TARGET_RATE, MAX_TARGET_RATE)),
        }
    }

    /// Current target rate in Hz.
    #[inline]
    pub fn get(&self) -> u32 {
        self.rate.load(Ordering::Acquire)
    }

    /// Store a new target rate.
    ///
    /// Takes a signed value so raw operator input (including negatives) can be
    /// passed straight through and rejected here.
    pub fn set(&self, requested: i64) -> Result<(), InvalidRate> {
        let rate = u32::try_from(requested)
            .ok()
            .filter(|r| (MIN_TARGET_RATE..=MAX_TARGET_RATE).contains(r))
            .ok_or(InvalidRate { requested })?;

        #[cfg(feature = "tracing")]
        {
            let previous = self.rate.swap(rate, Ordering::AcqRel);
            tracing::debug!(previous, rate, "target rate updated");
        }
        #[cfg(not(feature = "tracing"))]
        {
            self.rate.store(rate, Ordering::Release);
        }
        Ok(())
    }

    /// Divisor between [`NATIVE_RATE`] and the current target rate.
    #[inline]
    pub fn divisor(&self) -> usize {
        resample::divisor(NATIVE_RATE, self.get())
    }
}

impl Default for RateControl {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rate() {
        let rate = RateControl::default();
        assert_eq!(rate.get(), DEFAULT_TARGET_RATE);
        assert_eq!(rate.divisor(), 3);
    }

    #[test]
    fn test_floor_is_inclusive() {
        let rate = RateControl::default();
        assert_eq!(rate.set(9), Err(InvalidRate { requested: 9 }));
        assert_eq!(rate.get(), DEFAULT_TARGET_RATE);

        assert!(rate.set(10).is_ok());
        assert_eq!(rate.get(), 10);
    }

    #[test]
    fn test_rejects_above_native() {
        let rate = RateControl::new(8000);
        assert!(rate.set(48_001).is_err());
        assert_eq!(rate.get(), 8000);
        assert!(rate.set(48_000).is_ok());
        assert_eq!(rate.divisor(), 1);
    }

    #[test]
    fn test_rejects_negative_and_huge() {
        let rate = RateControl::new(8000);
        assert!(rate.set(-16_000).is_err());
        assert!(rate.set(0).is_err());
        assert!(rate.set(i64::from(u32::MAX) + 1).is_err());
        assert_eq!(rate.get(), 8000);
    }

    #[test]
    fn test_constructor_clamps() {
        assert_eq!(RateControl::new(0).get(), MIN_TARGET_RATE);
        assert_eq!(RateControl::new(96_000).get(), MAX_TARGET_RATE);
    }

    #[test]
    fn test_divisor_tracks_updates() {
        let rate = RateControl::default();
        rate.set(8000).unwrap();
        assert_eq!(rate.divisor(), 6);
        rate.set(10).unwrap();
        assert_eq!(rate.divisor(), 4800);
        rate.set(47_999).unwrap();
        assert_eq!(rate.divisor(), 1);
    }

    #[test]
    fn test_invalid_rate_message() {
        let msg = InvalidRate { requested: 9 }.to_string();
        assert!(msg.contains('9'));
        assert!(msg.contains("10..=48000"));
    }
}
