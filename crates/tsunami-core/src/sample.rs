//! 16-bit sample clipping.
//!
//! Two ranges are in play. Shaping clips to the full `i16` range, while the
//! final output stage clips symmetrically to ±[`OUTPUT_PEAK`], which keeps
//! `-32768` (the one value without a positive counterpart) off the device.

/// Largest magnitude written to the output device.
pub const OUTPUT_PEAK: i16 = i16::MAX;

/// Saturate a widened sample into the `i16` range.
///
/// ```rust
/// use tsunami_core::clip_to_i16;
///
/// assert_eq!(clip_to_i16(70_000), i16::MAX);
/// assert_eq!(clip_to_i16(-70_000), i16::MIN);
/// assert_eq!(clip_to_i16(-5), -5);
/// ```
#[inline]
pub fn clip_to_i16(value: i32) -> i16 {
    value.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

/// Clip a block in place to `-OUTPUT_PEAK..=OUTPUT_PEAK`.
#[inline]
pub fn clip_symmetric(block: &mut [i16]) {
    for sample in block {
        *sample = (*sample).max(-OUTPUT_PEAK);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_clip_only_moves_min() {
        let mut block = [i16::MIN, -32767, 0, 32767];
        clip_symmetric(&mut block);
        assert_eq!(block, [-32767, -32767, 0, 32767]);
    }
}
