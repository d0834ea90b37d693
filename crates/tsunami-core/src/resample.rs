//! Integer-ratio resampling between the native rate and the target rate.
//!
//! Both directions are deliberately crude: [`decimate`] keeps every Nth sample
//! with no anti-aliasing filter, and [`repeat_expand`] is nearest-neighbor
//! upsampling. The aliasing and stair-stepping are the effect.
//!
//! The round trip does not always restore the original length. Decimation
//! rounds up (`ceil(len / d)`), so expansion yields `d * ceil(len / d)`
//! samples, which exceeds `len` whenever `d` does not divide it:
//!
//! | len | d | decimated | expanded |
//! |-----|---|-----------|----------|
//! | 1024 | 1 | 1024 | 1024 |
//! | 1024 | 3 | 342 | 1026 |
//! | 1024 | 4 | 256 | 1024 |
//! | 1024 | 4800 | 1 | 4800 |
//!
//! The `_into` variants reuse a caller-owned buffer and are what the
//! processing thread calls.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// Divisor between `native_rate` and `target_rate`, never less than 1.
///
/// A zero target or a target above the native rate would make the plain
/// integer division 0 (or divide by zero); both collapse to 1, which turns
/// the resampling pair into the identity.
///
/// ```rust
/// use tsunami_core::divisor;
///
/// assert_eq!(divisor(48_000, 16_000), 3);
/// assert_eq!(divisor(48_000, 10), 4800);
/// assert_eq!(divisor(48_000, 96_000), 1);
/// assert_eq!(divisor(48_000, 0), 1);
/// ```
#[inline]
pub fn divisor(native_rate: u32, target_rate: u32) -> usize {
    native_rate
        .checked_div(target_rate)
        .map_or(1, |d| (d as usize).max(1))
}

/// Length of `decimate(block, divisor)` for a block of `len` samples.
#[inline]
pub fn decimated_len(len: usize, divisor: usize) -> usize {
    len.div_ceil(divisor.max(1))
}

/// Keep samples at indices `0, d, 2d, ...`.
pub fn decimate(block: &[i16], divisor: usize) -> Vec<i16> {
    let mut out = Vec::with_capacity(decimated_len(block.len(), divisor));
    decimate_into(block, divisor, &mut out);
    out
}

/// [`decimate`] into `out`, replacing its contents.
pub fn decimate_into(block: &[i16], divisor: usize, out: &mut Vec<i16>) {
    out.clear();
    out.extend(block.iter().step_by(divisor.max(1)).copied());
}

/// Repeat each sample `divisor` times consecutively.
pub fn repeat_expand(block: &[i16], divisor: usize) -> Vec<i16> {
    let mut out = Vec::with_capacity(block.len() * divisor.max(1));
    repeat_expand_into(block, divisor, &mut out);
    out
}

/// [`repeat_expand`] into `out`, replacing its contents.
pub fn repeat_expand_into(block: &[i16], divisor: usize, out: &mut Vec<i16>) {
    let d = divisor.max(1);
    out.clear();
    out.reserve(block.len() * d);
    for &sample in block {
        out.extend(core::iter::repeat_n(sample, d));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimate_keeps_every_nth() {
        let block: Vec<i16> = (0..10).collect();
        assert_eq!(decimate(&block, 3), vec![0, 3, 6, 9]);
        assert_eq!(decimate(&block, 4), vec![0, 4, 8]);
        assert_eq!(decimate(&block, 20), vec![0]);
    }

    #[test]
    fn test_repeat_expand() {
        assert_eq!(repeat_expand(&[1, -2], 3), vec![1, 1, 1, -2, -2, -2]);
    }

    #[test]
    fn test_zero_divisor_is_identity() {
        let block = [5i16, 6, 7];
        assert_eq!(decimate(&block, 0), block.to_vec());
        assert_eq!(repeat_expand(&block, 0), block.to_vec());
        assert_eq!(decimated_len(3, 0), 3);
    }

    #[test]
    fn test_empty_block() {
        assert!(decimate(&[], 3).is_empty());
        assert!(repeat_expand(&[], 3).is_empty());
    }

    #[test]
    fn test_divisor_for_whole_range() {
        for target in 10..=48_000 {
            let d = divisor(48_000, target);
            assert!(d >= 1);
            assert_eq!(d, (48_000 / target).max(1) as usize);
        }
    }

    #[test]
    fn test_rounding_boundary_at_block_size() {
        let block = [0i16; 1024];
        let low = decimate(&block, 3);
        assert_eq!(low.len(), 342);
        assert_eq!(repeat_expand(&low, 3).len(), 1026);

        let low = decimate(&block, 4);
        assert_eq!(repeat_expand(&low, 4).len(), 1024);
    }

    #[test]
    fn test_into_variants_reuse_buffer() {
        let mut buf = vec![9i16; 64];
        decimate_into(&[1, 2, 3, 4], 2, &mut buf);
        assert_eq!(buf, vec![1, 3]);
        repeat_expand_into(&[1, 3], 2, &mut buf);
        assert_eq!(buf, vec![1, 1, 3, 3]);
    }
}
