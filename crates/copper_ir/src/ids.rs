//! Opaque ID newtypes for arena entries.

use crate::arena::ArenaId;
use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl ArenaId for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }

            fn as_raw(self) -> u32 {
                self.0
            }
        }
    };
}

define_id!(
    /// An operand in a [`Design`](crate::design::Design).
    OperandId
);

define_id!(
    /// A physical part requested by a built-in module.
    PartId
);

define_id!(
    /// An electrical node created during generation.
    NetworkId
);

define_id!(
    /// A placed component created during generation.
    ComponentId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_roundtrip() {
        assert_eq!(OperandId::from_raw(7).as_raw(), 7);
        assert_eq!(<NetworkId as ArenaId>::from_raw(3), NetworkId::from_raw(3));
    }

    #[test]
    fn serializes_as_number() {
        assert_eq!(serde_json::to_string(&PartId::from_raw(5)).unwrap(), "5");
    }
}
