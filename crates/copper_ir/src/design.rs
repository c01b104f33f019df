//! The flattened design produced by elaboration.

use crate::arena::Arena;
use crate::error::OperandError;
use crate::ids::{OperandId, PartId};
use crate::operand::{Operand, OperandKind, Writer};
use crate::part::PartSpec;
use crate::range::BitRange;
use copper_common::{lane_mask, Ident, Interner, MAX_WIDTH};
use copper_source::Span;
use std::collections::{HashMap, HashSet};

/// A pull resistor on one bit of an operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pull {
    /// The pulled operand, as seen by the pull module.
    pub target: OperandId,
    /// 0-based bit of `target`.
    pub bit: u32,
    /// Pulled to VCC (`true`) or GND (`false`).
    pub up: bool,
    /// The resistor.
    pub part: PartId,
}

/// Every operand, part and port of one elaborated top module.
///
/// Operands keep their shape once created; only writer lists, pin bindings
/// and validation flags change afterwards.
#[derive(Debug)]
pub struct Design {
    interner: Interner,
    operands: Arena<OperandId, Operand>,
    parts: Arena<PartId, PartSpec>,
    by_name: HashMap<Ident, OperandId>,
    ports: Vec<OperandId>,
    pulls: Vec<Pull>,
}

impl Design {
    /// Creates an empty design.
    pub fn new() -> Self {
        Self {
            interner: Interner::new(),
            operands: Arena::new(),
            parts: Arena::new(),
            by_name: HashMap::new(),
            ports: Vec::new(),
            pulls: Vec::new(),
        }
    }

    /// The interner holding every operand name.
    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    /// Name of an operand.
    pub fn name(&self, id: OperandId) -> &str {
        self.interner.resolve(self.operands[id].name)
    }

    /// Returns an operand.
    pub fn operand(&self, id: OperandId) -> &Operand {
        &self.operands[id]
    }

    /// All operands.
    pub fn operands(&self) -> &Arena<OperandId, Operand> {
        &self.operands
    }

    /// Looks up a pin, wire or part output by full name.
    pub fn find(&self, name: &str) -> Option<OperandId> {
        let ident = self.interner.get(name)?;
        self.by_name.get(&ident).copied()
    }

    /// Adds an operand.
    ///
    /// Pins, wires and part outputs become findable by name; constants and
    /// slices do not.
    pub fn add_operand(&mut self, operand: Operand) -> OperandId {
        let named = !matches!(
            operand.kind,
            OperandKind::Const { .. } | OperandKind::Field { .. }
        );
        let name = operand.name;
        let id = self.operands.alloc(operand);
        if named {
            self.by_name.entry(name).or_insert(id);
        }
        id
    }

    /// Adds a literal.
    ///
    /// A positive `declared` width is used verbatim and the value masked to
    /// it. Otherwise the width is the number of bits the value needs, at
    /// least 1 and at most 32.
    pub fn constant(
        &mut self,
        value: u64,
        declared: u32,
        span: Span,
    ) -> Result<OperandId, OperandError> {
        if declared > MAX_WIDTH {
            return Err(OperandError::TooWide {
                name: value.to_string(),
                width: declared as u64,
            });
        }
        let width = if declared > 0 {
            declared
        } else {
            (u64::BITS - value.leading_zeros()).clamp(1, MAX_WIDTH)
        };
        let value = value as u32 & lane_mask(width);
        let name = self.interner.get_or_intern(&format!("{width}'d{value}"));
        Ok(self.add_operand(Operand::new(
            name,
            BitRange::of_width(width),
            OperandKind::Const { value },
            span,
        )))
    }

    /// Adds a read-only view of bits `lo..=hi` of `target`.
    pub fn slice(
        &mut self,
        target: OperandId,
        lo: i32,
        hi: i32,
        span: Span,
    ) -> Result<OperandId, OperandError> {
        let range = self.check_range(target, lo, hi)?;
        let name = format!("{}{}", self.name(target), range);
        let name = self.interner.get_or_intern(&name);
        Ok(self.add_operand(Operand::new(
            name,
            range,
            OperandKind::Field { target },
            span,
        )))
    }

    /// Checks that `lo..=hi` is a valid sub-range of `target`.
    pub fn check_range(&self, target: OperandId, lo: i32, hi: i32) -> Result<BitRange, OperandError> {
        let outer = self.operands[target].range;
        match BitRange::new(lo, hi) {
            Some(range) if outer.covers(range) => Ok(range),
            _ => Err(OperandError::InvalidSlice {
                name: self.name(target).to_string(),
                lo,
                hi,
                range: outer,
            }),
        }
    }

    /// Records that `source` drives `range` of `target`.
    ///
    /// Overlaps are only detected by [`check_writers`](Self::check_writers).
    pub fn add_writer(
        &mut self,
        target: OperandId,
        range: BitRange,
        source: OperandId,
        span: Span,
    ) -> Result<(), OperandError> {
        let op = &self.operands[target];
        if op.is_input() {
            return Err(OperandError::WriteToInput {
                name: self.name(target).to_string(),
            });
        }
        if !op.is_writable() {
            return Err(OperandError::NotWritable {
                name: self.name(target).to_string(),
            });
        }
        if !op.range.covers(range) {
            return Err(OperandError::InvalidSlice {
                name: self.name(target).to_string(),
                lo: range.lo,
                hi: range.hi,
                range: op.range,
            });
        }
        let found = self.operands[source].width();
        if found != range.width() {
            return Err(OperandError::WidthMismatch {
                name: self.name(target).to_string(),
                expected: range.width(),
                found,
            });
        }
        if let Some(writers) = self.operands[target].writers_mut() {
            writers.push(Writer {
                range,
                source,
                span,
            });
        }
        Ok(())
    }

    /// Binds an instance input pin to the parent's argument.
    ///
    /// # Panics
    ///
    /// Panics if `pin` is not an unbound input pin.
    pub fn bind(&mut self, pin: OperandId, binding: OperandId) -> Result<(), OperandError> {
        let expected = self.operands[pin].width();
        let found = self.operands[binding].width();
        if expected != found {
            return Err(OperandError::WidthMismatch {
                name: self.name(pin).to_string(),
                expected,
                found,
            });
        }
        match &mut self.operands[pin].kind {
            OperandKind::InPin { binding: slot, .. } => {
                assert!(slot.is_none(), "input pin bound twice");
                *slot = Some(binding);
            }
            other => panic!("binding a non-input operand: {other:?}"),
        }
        Ok(())
    }

    /// Validates the writers of one operand and marks it usable.
    ///
    /// Non-wired operands must have pairwise disjoint writers. On success the
    /// ranges that no writer covers are returned. Operands that are not
    /// writable always succeed with no gaps.
    pub fn check_writers(&mut self, id: OperandId) -> Result<Vec<BitRange>, OperandError> {
        let op = &self.operands[id];
        if !op.is_writable() {
            return Ok(Vec::new());
        }
        let mut ranges: Vec<BitRange> = op.writers().iter().map(|w| w.range).collect();
        ranges.sort_by_key(|r| (r.lo, r.hi));
        if !op.is_wired() {
            if let Some(pair) = ranges.windows(2).find(|p| p[0].overlaps(p[1])) {
                return Err(OperandError::OverlappingWriters {
                    name: self.name(id).to_string(),
                    first: pair[0],
                    second: pair[1],
                });
            }
        }

        let mut gaps = Vec::new();
        let mut next = op.range.lo;
        for r in &ranges {
            if r.lo > next {
                gaps.extend(BitRange::new(next, r.lo - 1));
            }
            next = next.max(r.hi + 1);
        }
        if next <= op.range.hi {
            gaps.extend(BitRange::new(next, op.range.hi));
        }
        self.operands[id].set_validated();
        Ok(gaps)
    }

    /// Follows a slice to its target.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not a slice or the forwarded bit lies outside the
    /// target.
    pub fn forward(&self, id: OperandId, bit: u32) -> (OperandId, u32) {
        let op = &self.operands[id];
        let OperandKind::Field { target } = op.kind else {
            panic!("forwarding through non-slice `{}`", self.name(id));
        };
        let outer = self.operands[target].range;
        let offset = op.range.lo as i64 - outer.lo as i64 + bit as i64;
        assert!(
            offset >= 0 && offset < outer.width() as i64,
            "bit {bit} of `{}` forwards outside `{}`",
            self.name(id),
            self.name(target)
        );
        (target, offset as u32)
    }

    /// Follows slices and bound pins down to the operand that holds the bit.
    pub fn root(&self, mut id: OperandId, mut bit: u32) -> (OperandId, u32) {
        loop {
            match self.operands[id].kind {
                OperandKind::Field { .. } => (id, bit) = self.forward(id, bit),
                OperandKind::InPin {
                    binding: Some(b), ..
                } => id = b,
                _ => return (id, bit),
            }
        }
    }

    /// Follows slices, bound pins and plain writers down to the operand whose
    /// network carries the bit.
    ///
    /// Stops at wired buses, part outputs, constants, unbound inputs and
    /// undriven bits. A plain writable follows its first covering writer.
    /// Returns `None` when plain writers alias each other in a cycle.
    pub fn net_root(&self, id: OperandId, bit: u32) -> Option<(OperandId, u32)> {
        let mut seen = HashSet::new();
        let (mut id, mut bit) = self.root(id, bit);
        while seen.insert((id, bit)) {
            let op = &self.operands[id];
            if !op.is_writable() || op.is_wired() {
                return Some((id, bit));
            }
            let abs = op.range.abs(bit);
            match op.covering_writers(abs).next() {
                Some(w) => (id, bit) = self.root(w.source, w.range.offset(abs)),
                None => return Some((id, bit)),
            }
        }
        None
    }

    /// Adds a part.
    pub fn add_part(&mut self, part: PartSpec) -> PartId {
        self.parts.alloc(part)
    }

    /// Returns a part.
    pub fn part(&self, id: PartId) -> &PartSpec {
        &self.parts[id]
    }

    /// Returns a part mutably, e.g. to fill in pins once its outputs exist.
    pub fn part_mut(&mut self, id: PartId) -> &mut PartSpec {
        &mut self.parts[id]
    }

    /// All parts.
    pub fn parts(&self) -> &Arena<PartId, PartSpec> {
        &self.parts
    }

    /// Records a pull resistor.
    pub fn add_pull(&mut self, pull: Pull) {
        self.pulls.push(pull);
    }

    /// All pull resistors.
    pub fn pulls(&self) -> &[Pull] {
        &self.pulls
    }

    /// Sets the top-level ports in parameter order.
    pub fn set_ports(&mut self, ports: Vec<OperandId>) {
        self.ports = ports;
    }

    /// Top-level ports in parameter order.
    pub fn ports(&self) -> &[OperandId] {
        &self.ports
    }
}

impl Default for Design {
    fn default() -> Self {
        Self::new()
    }
}
