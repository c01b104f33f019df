//! Inclusive bit ranges.

use copper_common::MAX_WIDTH;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An inclusive `[lo, hi]` range of absolute bit indices.
///
/// Bits handed to generation and simulation are 0-based offsets from `lo`;
/// absolute indices only appear in names and source slices.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct BitRange {
    /// Lowest absolute index.
    pub lo: i32,
    /// Highest absolute index.
    pub hi: i32,
}

impl BitRange {
    /// Creates a range, or `None` if `hi < lo`.
    pub fn new(lo: i32, hi: i32) -> Option<Self> {
        (hi >= lo).then_some(Self { lo, hi })
    }

    /// `[0, width - 1]`.
    ///
    /// # Panics
    ///
    /// Panics if `width` is zero.
    pub fn of_width(width: u32) -> Self {
        assert!(width > 0, "empty bit range");
        Self {
            lo: 0,
            hi: width as i32 - 1,
        }
    }

    /// Number of bits.
    pub fn width(self) -> u32 {
        (self.hi as i64 - self.lo as i64 + 1) as u32
    }

    /// Returns `true` if the width fits in one value.
    pub fn fits(self) -> bool {
        self.width() <= MAX_WIDTH
    }

    /// Returns `true` if absolute index `abs` lies in the range.
    pub fn contains(self, abs: i32) -> bool {
        self.lo <= abs && abs <= self.hi
    }

    /// Returns `true` if `other` lies completely inside this range.
    pub fn covers(self, other: BitRange) -> bool {
        self.lo <= other.lo && other.hi <= self.hi
    }

    /// Returns `true` if the ranges share at least one bit.
    pub fn overlaps(self, other: BitRange) -> bool {
        self.lo <= other.hi && other.lo <= self.hi
    }

    /// Absolute index of 0-based offset `bit`.
    pub fn abs(self, bit: u32) -> i32 {
        self.lo + bit as i32
    }

    /// 0-based offset of absolute index `abs`.
    ///
    /// # Panics
    ///
    /// Panics if `abs` is outside the range.
    pub fn offset(self, abs: i32) -> u32 {
        assert!(self.contains(abs), "bit {abs} outside {self}");
        (abs - self.lo) as u32
    }
}

impl fmt::Display for BitRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.lo == self.hi {
            write!(f, "[{}]", self.lo)
        } else {
            write!(f, "[{}:{}]", self.hi, self.lo)
        }
    }
}
