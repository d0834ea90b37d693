//! The "tsunami" waveshaper.
//!
//! A per-index gain pattern over a block: samples whose index `i` satisfies
//! `i % modulus == residue` are multiplied by `gain`, every other sample passes
//! through at unity, and the result is saturated to the `i16` range.
//!
//! # The default rule never fires
//!
//! [`ShapeRule::TSUNAMI`] is `i % 2 == 15`. `i % 2` is only ever 0 or 1, so no
//! index matches and the default shaper is the identity. This is almost
//! certainly a defect in the effect's definition (`i % 16 == 15`
//! would give one boosted sample in sixteen), but it is kept as-is until
//! someone decides what the effect should sound like. Other patterns can be
//! selected explicitly:
//!
//! ```rust
//! use tsunami_core::{ShapeRule, WaveShaper};
//!
//! let literal = WaveShaper::new();
//! assert_eq!(literal.shape(&[100, 200, 300]), vec![100, 200, 300]);
//!
//! let rule: ShapeRule = "2:1:2".parse().unwrap();
//! let odd_boost = WaveShaper::with_rule(rule);
//! assert_eq!(odd_boost.shape(&[100, 200, 300]), vec![100, 400, 300]);
//! ```

use core::fmt;
use core::str::FromStr;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::sample::clip_to_i16;

/// Which indices get boosted, and by how much.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeRule {
    /// Index modulus. A modulus of 0 matches nothing.
    pub modulus: usize,
    /// Residue an index must leave to be boosted.
    pub residue: usize,
    /// Gain applied to matching samples before clipping.
    pub gain: i32,
}

impl ShapeRule {
    /// The effect as defined: `i % 2 == 15`, gain 2. Unreachable.
    pub const TSUNAMI: Self = Self {
        modulus: 2,
        residue: 15,
        gain: 2,
    };

    /// Gain for the sample at `index`.
    #[inline]
    pub fn factor(&self, index: usize) -> i32 {
        if self.modulus != 0 && index % self.modulus == self.residue {
            self.gain
        } else {
            1
        }
    }

    /// Whether any index can ever match.
    pub fn is_reachable(&self) -> bool {
        self.modulus != 0 && self.residue < self.modulus
    }
}

impl Default for ShapeRule {
    fn default() -> Self {
        Self::TSUNAMI
    }
}

impl fmt::Display for ShapeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.modulus, self.residue, self.gain)
    }
}

/// Error returned when a `MODULUS:RESIDUE:GAIN` string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseShapeRuleError;

impl fmt::Display for ParseShapeRuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("expected MODULUS:RESIDUE:GAIN, e.g. 16:15:2")
    }
}

impl core::error::Error for ParseShapeRuleError {}

impl FromStr for ShapeRule {
    type Err = ParseShapeRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split(':');
        let mut next = || parts.next().map(str::trim).ok_or(ParseShapeRuleError);

        let modulus = next()?.parse().map_err(|_| ParseShapeRuleError)?;
        let residue = next()?.parse().map_err(|_| ParseShapeRuleError)?;
        let gain = next()?.parse().map_err(|_| ParseShapeRuleError)?;
        if parts.next().is_some() {
            return Err(ParseShapeRuleError);
        }

        Ok(Self {
            modulus,
            residue,
            gain,
        })
    }
}

/// Stateless per-index gain shaper.
#[derive(Debug, Clone, Copy, Default)]
pub struct WaveShaper {
    rule: ShapeRule,
}

impl WaveShaper {
    /// Shaper using [`ShapeRule::TSUNAMI`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Shaper using an explicit rule.
    pub fn with_rule(rule: ShapeRule) -> Self {
        Self { rule }
    }

    /// The active rule.
    pub fn rule(&self) -> ShapeRule {
        self.rule
    }

    /// Shape one sample at block position `index`.
    #[inline]
    pub fn shape_sample(&self, index: usize, sample: i16) -> i16 {
        clip_to_i16(i32::from(sample).saturating_mul(self.rule.factor(index)))
    }

    /// Shape a block, returning a new block of the same length.
    pub fn shape(&self, block: &[i16]) -> Vec<i16> {
        block
            .iter()
            .enumerate()
            .map(|(i, &s)| self.shape_sample(i, s))
            .collect()
    }

    /// Shape a block in place.
    pub fn shape_in_place(&self, block: &mut [i16]) {
        if self.rule.gain == 1 || !self.rule.is_reachable() {
            return;
        }
        for (i, sample) in block.iter_mut().enumerate() {
            *sample = self.shape_sample(i, *sample);
        }
    }
}
