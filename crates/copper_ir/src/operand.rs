//! Operands: bit-vector circuit values.
//!
//! Every operand is readable: generation can resolve any of its bits to a
//! network and simulation can compute its value at any tick. Output pins and
//! wires are additionally writable and collect [`Writer`] records, which are
//! validated once before the design is used.

use crate::ids::{OperandId, PartId};
use crate::range::BitRange;
use copper_common::Ident;
use copper_source::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Binds a range of a writable operand to the operand that drives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Writer {
    /// Absolute range of the target that is driven.
    pub range: BitRange,
    /// The driving operand. Its width equals `range.width()`.
    pub source: OperandId,
    /// Where the write was written.
    pub span: Span,
}

/// Combinational function of a built-in gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateFunc {
    /// `a & b`
    And,
    /// `a | b`
    Or,
    /// `!(a & b)`
    Nand,
    /// `!(a | b)`
    Nor,
    /// `a ^ b`
    Xor,
    /// `!a`
    Not,
    /// `a`
    Buf,
}

impl GateFunc {
    /// Number of inputs.
    pub fn arity(self) -> usize {
        match self {
            GateFunc::Not | GateFunc::Buf => 1,
            _ => 2,
        }
    }

    /// Lower-case name.
    pub fn name(self) -> &'static str {
        match self {
            GateFunc::And => "and",
            GateFunc::Or => "or",
            GateFunc::Nand => "nand",
            GateFunc::Nor => "nor",
            GateFunc::Xor => "xor",
            GateFunc::Not => "not",
            GateFunc::Buf => "buf",
        }
    }
}

impl fmt::Display for GateFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a part computes its driven outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriveLogic {
    /// Bitwise gate over same-width inputs.
    Gate {
        /// The function.
        func: GateFunc,
        /// Input operands, `func.arity()` of them.
        inputs: Vec<OperandId>,
        /// Outputs only ever pull low.
        open_collector: bool,
    },
    /// Rising-edge register.
    Register {
        /// One-bit clock.
        clk: OperandId,
        /// Data input.
        d: OperandId,
    },
}

impl DriveLogic {
    /// Operands read by this logic.
    pub fn inputs(&self) -> Vec<OperandId> {
        match self {
            DriveLogic::Gate { inputs, .. } => inputs.clone(),
            DriveLogic::Register { clk, d } => vec![*clk, *d],
        }
    }
}

/// The closed set of operand kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperandKind {
    /// Literal value, already masked to the operand width.
    Const {
        /// The value.
        value: u32,
    },
    /// Module input. Instance inputs are bound to the parent's argument.
    InPin {
        /// The operand this pin forwards to.
        binding: Option<OperandId>,
        /// Whether the simulation harness may force it.
        forceable: bool,
    },
    /// Module output.
    OutPin {
        /// Drivers of the pin.
        writers: Vec<Writer>,
    },
    /// Read-only view of bits `range` of `target`, in the target's indices.
    Field {
        /// The viewed operand.
        target: OperandId,
    },
    /// Internal wire.
    Wire {
        /// Open-collector bus: overlapping writers are merged.
        wired: bool,
        /// Drivers of the wire.
        writers: Vec<Writer>,
    },
    /// Outputs of a physical part.
    Driven {
        /// The part.
        part: PartId,
        /// What the part computes.
        logic: DriveLogic,
        /// Part pin number of each output bit.
        pins: Vec<u16>,
    },
}

/// A bit-vector value with a stable interned name.
#[derive(Debug, Clone)]
pub struct Operand {
    /// Name, including the instance suffix.
    pub name: Ident,
    /// Inclusive bit range.
    pub range: BitRange,
    /// Kind-specific data.
    pub kind: OperandKind,
    /// Declaration or expression span.
    pub span: Span,
    validated: bool,
}

impl Operand {
    /// Creates an operand.
    pub fn new(name: Ident, range: BitRange, kind: OperandKind, span: Span) -> Self {
        Self {
            name,
            range,
            kind,
            span,
            validated: false,
        }
    }

    /// Number of bits.
    pub fn width(&self) -> u32 {
        self.range.width()
    }

    /// Returns `true` for operands that accept writers.
    pub fn is_writable(&self) -> bool {
        matches!(
            self.kind,
            OperandKind::OutPin { .. } | OperandKind::Wire { .. }
        )
    }

    /// Returns `true` for open-collector buses.
    pub fn is_wired(&self) -> bool {
        matches!(self.kind, OperandKind::Wire { wired: true, .. })
    }

    /// Returns `true` for input pins.
    pub fn is_input(&self) -> bool {
        matches!(self.kind, OperandKind::InPin { .. })
    }

    /// Writers of a writable operand; empty for every other kind.
    pub fn writers(&self) -> &[Writer] {
        match &self.kind {
            OperandKind::OutPin { writers } | OperandKind::Wire { writers, .. } => writers,
            _ => &[],
        }
    }

    pub(crate) fn writers_mut(&mut self) -> Option<&mut Vec<Writer>> {
        match &mut self.kind {
            OperandKind::OutPin { writers } | OperandKind::Wire { writers, .. } => Some(writers),
            _ => None,
        }
    }

    /// Writers whose range covers absolute index `abs`.
    pub fn covering_writers(&self, abs: i32) -> impl Iterator<Item = &Writer> {
        self.writers().iter().filter(move |w| w.range.contains(abs))
    }

    /// Returns `true` once the writers have been checked.
    ///
    /// Operands that are not writable are always valid.
    pub fn is_validated(&self) -> bool {
        !self.is_writable() || self.validated
    }

    pub(crate) fn set_validated(&mut self) {
        self.validated = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use copper_common::Interner;

    fn operand(kind: OperandKind) -> Operand {
        let interner = Interner::new();
        Operand::new(
            interner.get_or_intern("x"),
            BitRange::of_width(4),
            kind,
            Span::DUMMY,
        )
    }

    #[test]
    fn capabilities_by_kind() {
        let wire = operand(OperandKind::Wire {
            wired: false,
            writers: Vec::new(),
        });
        assert!(wire.is_writable() && !wire.is_wired());
        let out = operand(OperandKind::OutPin {
            writers: Vec::new(),
        });
        assert!(out.is_writable());
        let pin = operand(OperandKind::InPin {
            binding: None,
            forceable: false,
        });
        assert!(!pin.is_writable() && pin.is_input());
        assert!(!operand(OperandKind::Const { value: 0 }).is_writable());
    }

    #[test]
    fn only_writables_need_validation() {
        let mut wire = operand(OperandKind::Wire {
            wired: true,
            writers: Vec::new(),
        });
        assert!(!wire.is_validated());
        wire.set_validated();
        assert!(wire.is_validated());
        assert!(operand(OperandKind::Const { value: 1 }).is_validated());
    }

    #[test]
    fn covering_writers_by_absolute_bit() {
        let mut wire = operand(OperandKind::Wire {
            wired: false,
            writers: Vec::new(),
        });
        let writers = wire.writers_mut().unwrap();
        writers.push(Writer {
            range: BitRange::new(0, 1).unwrap(),
            source: OperandId::from_raw(1),
            span: Span::DUMMY,
        });
        writers.push(Writer {
            range: BitRange::new(2, 3).unwrap(),
            source: OperandId::from_raw(2),
            span: Span::DUMMY,
        });
        let sources: Vec<_> = wire.covering_writers(2).map(|w| w.source).collect();
        assert_eq!(sources, vec![OperandId::from_raw(2)]);
    }

    #[test]
    fn gate_arity() {
        assert_eq!(GateFunc::Not.arity(), 1);
        assert_eq!(GateFunc::Nand.arity(), 2);
        assert_eq!(GateFunc::Xor.to_string(), "xor");
    }
}
