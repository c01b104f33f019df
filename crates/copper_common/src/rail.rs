//! Two-rail packed signal values.
//!
//! A [`Rail`] packs two 32-bit planes into one `u64`: the upper half records
//! lanes asserted to logic 1, the lower half lanes asserted to logic 0. A
//! fully driven single-driver value has complementary planes; merging drivers
//! is a plane-wise OR, so a lane present in neither plane floats and a lane
//! present in both is a drive conflict.

use crate::logic::Logic;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Not};

/// Maximum number of lanes a single value can carry.
pub const MAX_WIDTH: u32 = 32;

/// Returns a mask with the low `width` lanes set.
pub fn lane_mask(width: u32) -> u32 {
    if width >= MAX_WIDTH {
        u32::MAX
    } else {
        (1u32 << width) - 1
    }
}

/// A packed two-rail value of up to 32 lanes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rail(u64);

impl Rail {
    /// Every lane floating.
    pub const FLOAT: Rail = Rail(0);

    /// Builds a value from its asserted-1 and asserted-0 planes.
    pub fn from_planes(ones: u32, zeros: u32) -> Self {
        Rail(((ones as u64) << 32) | zeros as u64)
    }

    /// Wraps a raw packed value.
    pub fn from_raw(raw: u64) -> Self {
        Rail(raw)
    }

    /// Returns the raw packed value.
    pub fn raw(self) -> u64 {
        self.0
    }

    /// Fully drives the low `width` lanes with the bits of `value`.
    pub fn from_value(value: u32, width: u32) -> Self {
        let mask = lane_mask(width);
        Self::from_planes(value & mask, !value & mask)
    }

    /// The asserted-1 plane.
    pub fn ones(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// The asserted-0 plane.
    pub fn zeros(self) -> u32 {
        self.0 as u32
    }

    /// Returns the state of one lane.
    ///
    /// # Panics
    ///
    /// Panics if `bit >= 32`.
    pub fn lane(self, bit: u32) -> Logic {
        assert!(bit < MAX_WIDTH, "lane {bit} out of range");
        Logic::from_planes(self.ones() >> bit & 1 != 0, self.zeros() >> bit & 1 != 0)
    }

    /// Returns a copy with one lane replaced.
    pub fn with_lane(self, bit: u32, state: Logic) -> Self {
        assert!(bit < MAX_WIDTH, "lane {bit} out of range");
        let clear = !(1u32 << bit);
        let (one, zero) = state.planes();
        Self::from_planes(
            (self.ones() & clear) | (one as u32) << bit,
            (self.zeros() & clear) | (zero as u32) << bit,
        )
    }

    /// Union of assertions of two drivers.
    pub fn merge(self, other: Rail) -> Self {
        Rail(self.0 | other.0)
    }

    /// Lanes asserted in both planes.
    pub fn conflicts(self) -> u32 {
        self.ones() & self.zeros()
    }

    /// Lanes among the low `width` asserted in neither plane.
    pub fn floating(self, width: u32) -> u32 {
        !(self.ones() | self.zeros()) & lane_mask(width)
    }

    /// Returns the numeric value if every one of the low `width` lanes is
    /// driven to exactly one level.
    pub fn to_value(self, width: u32) -> Option<u32> {
        let mask = lane_mask(width);
        if self.conflicts() & mask != 0 || self.floating(width) != 0 {
            return None;
        }
        Some(self.ones() & mask)
    }

    /// Extracts `width` lanes starting at `offset`, moved down to lane 0.
    pub fn extract(self, offset: u32, width: u32) -> Self {
        assert!(offset < MAX_WIDTH, "offset {offset} out of range");
        let mask = lane_mask(width);
        Self::from_planes(
            (self.ones() >> offset) & mask,
            (self.zeros() >> offset) & mask,
        )
    }

    /// Moves every lane up by `offset`.
    pub fn place(self, offset: u32) -> Self {
        assert!(offset < MAX_WIDTH, "offset {offset} out of range");
        Self::from_planes(self.ones() << offset, self.zeros() << offset)
    }

    /// Clears every lane at or above `width`.
    pub fn masked(self, width: u32) -> Self {
        let mask = lane_mask(width);
        Self::from_planes(self.ones() & mask, self.zeros() & mask)
    }

    /// Drops the asserted-1 plane: an open-collector output only ever pulls low.
    pub fn open_collector(self) -> Self {
        Self::from_planes(0, self.zeros())
    }

    /// Fills floating lanes with pull resistor levels.
    ///
    /// `up` and `down` are lane masks of pull-ups and pull-downs. Only lanes
    /// that no driver asserts are affected; a lane pulled both ways ends up
    /// in conflict.
    pub fn pull(self, up: u32, down: u32, width: u32) -> Self {
        let float = self.floating(width);
        Self::from_planes(self.ones() | (up & float), self.zeros() | (down & float))
    }

    /// Formats the low `width` lanes, most significant first.
    pub fn to_bit_string(self, width: u32) -> String {
        (0..width.min(MAX_WIDTH))
            .rev()
            .map(|bit| self.lane(bit).vcd_char())
            .collect()
    }
}

impl BitAnd for Rail {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Rail::from_planes(self.ones() & rhs.ones(), self.zeros() | rhs.zeros())
    }
}

impl BitOr for Rail {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Rail::from_planes(self.ones() | rhs.ones(), self.zeros() & rhs.zeros())
    }
}

impl BitXor for Rail {
    type Output = Self;

    fn bitxor(self, rhs: Self) -> Self {
        let (a1, a0, b1, b0) = (self.ones(), self.zeros(), rhs.ones(), rhs.zeros());
        Rail::from_planes((a1 & b0) | (a0 & b1), (a1 & b1) | (a0 & b0))
    }
}

impl Not for Rail {
    type Output = Self;

    fn not(self) -> Self {
        Rail::from_planes(self.zeros(), self.ones())
    }
}

impl fmt::Debug for Rail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rail({:08x}/{:08x})", self.ones(), self.zeros())
    }
}
