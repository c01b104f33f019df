//! Stable part timestamps derived from component names.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-bit timestamp identifying a component across regenerations.
///
/// Netlist tools key annotation data (reference designators) by a per-part
/// timestamp. Copper derives it from the hierarchical component name with
/// XXH3, so the same part in the same place of the hierarchy keeps the same
/// timestamp every time the design is regenerated.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(u32);

impl Timestamp {
    /// Computes the timestamp of a component name.
    pub fn of_name(name: &str) -> Self {
        let hash = xxhash_rust::xxh3::xxh3_64(name.as_bytes());
        Self((hash >> 32) as u32 ^ hash as u32)
    }

    /// Returns the raw 32-bit value.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

/// Renders as 8 uppercase hex digits, the form used in netlist files.
impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({:08X})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        assert_eq!(
            Timestamp::of_name("pull.0/pu"),
            Timestamp::of_name("pull.0/pu")
        );
    }

    #[test]
    fn different_names_differ() {
        assert_ne!(
            Timestamp::of_name("pull.0/pu"),
            Timestamp::of_name("pull.1/pu")
        );
    }

    #[test]
    fn display_is_eight_hex_digits() {
        let s = Timestamp::of_name("gate/u1").to_string();
        assert_eq!(s.len(), 8);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn serde_roundtrip() {
        let ts = Timestamp::of_name("reg/r0");
        let json = serde_json::to_string(&ts).unwrap();
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(ts, back);
    }
}
