//! The state of a single signal lane in the two-rail encoding.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The resolved state of one bit lane.
///
/// The two-rail encoding records, per lane, whether some driver asserts a 1
/// and whether some driver asserts a 0. The four combinations map to:
/// - `Zero`: only the 0 plane is asserted
/// - `One`: only the 1 plane is asserted
/// - `X`: both planes are asserted (drive conflict)
/// - `Z`: neither plane is asserted (floating)
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[repr(u8)]
pub enum Logic {
    /// Driven low.
    Zero = 0,
    /// Driven high.
    One = 1,
    /// Driven both ways at once.
    X = 2,
    /// Not driven.
    Z = 3,
}

impl Logic {
    /// Builds a lane state from its two plane bits.
    pub fn from_planes(one: bool, zero: bool) -> Self {
        match (one, zero) {
            (true, true) => Logic::X,
            (true, false) => Logic::One,
            (false, true) => Logic::Zero,
            (false, false) => Logic::Z,
        }
    }

    /// Returns the `(asserted-1, asserted-0)` plane bits of this state.
    pub fn planes(self) -> (bool, bool) {
        match self {
            Logic::Zero => (false, true),
            Logic::One => (true, false),
            Logic::X => (true, true),
            Logic::Z => (false, false),
        }
    }

    /// The lowercase character used in waveform dumps.
    pub fn vcd_char(self) -> char {
        match self {
            Logic::Zero => '0',
            Logic::One => '1',
            Logic::X => 'x',
            Logic::Z => 'z',
        }
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Logic::Zero => write!(f, "0"),
            Logic::One => write!(f, "1"),
            Logic::X => write!(f, "X"),
            Logic::Z => write!(f, "Z"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Logic::{self, *};

    #[test]
    fn planes_roundtrip() {
        for l in [Zero, One, X, Z] {
            let (one, zero) = l.planes();
            assert_eq!(Logic::from_planes(one, zero), l);
        }
    }

    #[test]
    fn display_and_vcd() {
        assert_eq!(format!("{Z}"), "Z");
        assert_eq!(Z.vcd_char(), 'z');
        assert_eq!(X.vcd_char(), 'x');
    }
}
