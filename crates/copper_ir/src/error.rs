//! Errors raised while building and wiring operands.

use crate::range::BitRange;

/// A source-level problem with an operand.
///
/// Elaboration turns these into diagnostics at the span of the expression
/// or declaration that caused them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OperandError {
    /// A writer was added to an input pin.
    #[error("cannot write to an input pin `{name}`")]
    WriteToInput {
        /// The pin.
        name: String,
    },

    /// A writer was added to a constant, slice or part output.
    #[error("`{name}` is not writable")]
    NotWritable {
        /// The operand.
        name: String,
    },

    /// Two writers of a non-wired operand share bits.
    #[error("writers of `{name}` overlap: {first} and {second}")]
    OverlappingWriters {
        /// The written operand.
        name: String,
        /// Range of the earlier writer.
        first: BitRange,
        /// Range of the later writer.
        second: BitRange,
    },

    /// A source's width differs from the range it drives.
    #[error("width mismatch on `{name}`: expected {expected} bits, found {found}")]
    WidthMismatch {
        /// The operand being written or bound.
        name: String,
        /// Width of the destination.
        expected: u32,
        /// Width of the source.
        found: u32,
    },

    /// A slice or write range is reversed or exceeds its operand.
    #[error("invalid range {lo}..{hi} of `{name}` with bits {range}")]
    InvalidSlice {
        /// The sliced operand.
        name: String,
        /// Requested low index.
        lo: i32,
        /// Requested high index.
        hi: i32,
        /// The operand's range.
        range: BitRange,
    },

    /// A declared or requested width exceeds 32 bits.
    #[error("width {width} of `{name}` exceeds 32 bits")]
    TooWide {
        /// The operand.
        name: String,
        /// The requested width.
        width: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_pin_message() {
        let err = OperandError::WriteToInput {
            name: "a".to_string(),
        };
        assert_eq!(err.to_string(), "cannot write to an input pin `a`");
    }

    #[test]
    fn overlap_message() {
        let err = OperandError::OverlappingWriters {
            name: "bus".to_string(),
            first: BitRange::new(0, 3).unwrap(),
            second: BitRange::new(2, 2).unwrap(),
        };
        assert_eq!(err.to_string(), "writers of `bus` overlap: [3:0] and [2]");
    }
}
