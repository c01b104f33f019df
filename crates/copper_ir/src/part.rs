//! Physical parts requested by built-in modules.

use crate::ids::OperandId;
use copper_source::Span;
use std::fmt;

/// A supply rail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RailKind {
    /// Ground.
    Gnd,
    /// Supply.
    Vcc,
}

impl RailKind {
    /// Net name of the rail.
    pub fn net_name(self) -> &'static str {
        match self {
            RailKind::Gnd => "GND",
            RailKind::Vcc => "VCC",
        }
    }
}

impl fmt::Display for RailKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.net_name())
    }
}

/// What one pin of a part connects to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinBinding {
    /// A supply rail.
    Rail(RailKind),
    /// Reads bit `bit` (0-based) of an operand.
    Operand {
        /// The read operand.
        operand: OperandId,
        /// 0-based bit.
        bit: u32,
    },
    /// Drives bit `bit` of a part-driven operand.
    Output {
        /// The driven operand.
        operand: OperandId,
        /// 0-based bit.
        bit: u32,
    },
}

/// A part to be placed on the board.
///
/// Pins are numbered from 1 in the order of `pins`.
#[derive(Debug, Clone)]
pub struct PartSpec {
    /// Hierarchical name: local name followed by the instance suffix.
    pub name: String,
    /// Reference designator prefix (`U`, `R`, ...).
    pub prefix: &'static str,
    /// Value printed in listings.
    pub value: String,
    /// Pin bindings, pin 1 first.
    pub pins: Vec<PinBinding>,
    /// The instance that requested the part.
    pub span: Span,
}

impl PartSpec {
    /// Iterates over `(pin number, binding)`.
    pub fn numbered_pins(&self) -> impl Iterator<Item = (u16, PinBinding)> + '_ {
        self.pins
            .iter()
            .enumerate()
            .map(|(i, binding)| (i as u16 + 1, *binding))
    }
}
