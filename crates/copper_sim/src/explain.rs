//! Provenance trees: how a bit got its value.
//!
//! [`Simulator::explain`] walks the same edges the evaluator follows and
//! records, per visited bit, its state and where it came from.

use std::fmt;

use copper_common::Logic;
use copper_ir::{DriveLogic, GateFunc, OperandId, OperandKind};

use crate::engine::Simulator;
use crate::error::{Halt, SimError};

/// Where a bit's value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// A literal.
    Constant,
    /// Forced by the harness.
    Forced,
    /// An unbound input that was never forced.
    Floating,
    /// A pull resistor filled a floating lane.
    Pulled {
        /// `true` for a pull-up.
        up: bool,
    },
    /// A slice of another operand.
    Slice,
    /// An instance input bound to its argument.
    Binding,
    /// The union of the writers covering the bit.
    Writers,
    /// Output of a gate.
    Gate {
        /// Gate function.
        func: GateFunc,
        /// Whether the output only pulls low.
        open_collector: bool,
    },
    /// Output of a register.
    Register {
        /// `true` when the clock rose this tick.
        edge: bool,
    },
    /// A register at tick 0.
    Reset,
    /// The depth limit stopped the walk here.
    Truncated,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Constant => f.write_str("constant"),
            Origin::Forced => f.write_str("forced"),
            Origin::Floating => f.write_str("floating"),
            Origin::Pulled { up: true } => f.write_str("pulled up"),
            Origin::Pulled { up: false } => f.write_str("pulled down"),
            Origin::Slice => f.write_str("slice"),
            Origin::Binding => f.write_str("binding"),
            Origin::Writers => f.write_str("writers"),
            Origin::Gate {
                func,
                open_collector: false,
            } => write!(f, "{func}"),
            Origin::Gate {
                func,
                open_collector: true,
            } => write!(f, "open-collector {func}"),
            Origin::Register { edge: true } => f.write_str("register, clock edge"),
            Origin::Register { edge: false } => f.write_str("register, hold"),
            Origin::Reset => f.write_str("register, reset"),
            Origin::Truncated => f.write_str("..."),
        }
    }
}

/// One visited bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    /// Operand name.
    pub operand: String,
    /// Absolute bit index.
    pub bit: i32,
    /// Tick.
    pub tick: u32,
    /// State of the bit.
    pub state: Logic,
    /// How the state was produced.
    pub origin: Origin,
    /// The bits it was computed from.
    pub children: Vec<Provenance>,
}

impl Provenance {
    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Provenance::node_count).sum::<usize>()
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        writeln!(
            f,
            "{:indent$}{}[{}] @{} = {}  {}",
            "",
            self.operand,
            self.bit,
            self.tick,
            self.state.vcd_char(),
            self.origin,
            indent = depth * 2
        )?;
        for child in &self.children {
            child.write_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

impl Simulator<'_> {
    /// Explains bit `bit` (0-based) of `id` at `tick`, at most `depth` levels deep.
    pub fn explain(
        &mut self,
        id: OperandId,
        bit: u32,
        tick: u32,
        depth: usize,
    ) -> Result<Provenance, SimError> {
        self.check_bit(id, bit)?;
        self.value(id, tick)?;
        self.guarded(|sim| sim.explain_node(id, bit, tick, depth))
    }

    fn explain_node(
        &mut self,
        id: OperandId,
        bit: u32,
        tick: u32,
        depth: usize,
    ) -> Result<Provenance, Halt> {
        let design = self.design();
        let op = design.operand(id);
        let abs = op.range.abs(bit);
        let mut node = Provenance {
            operand: design.name(id).to_string(),
            bit: abs,
            tick,
            state: self.eval_lanes(id, tick, bit, 1)?.lane(0),
            origin: Origin::Truncated,
            children: Vec::new(),
        };
        if depth == 0 {
            return Ok(node);
        }
        let next = depth - 1;

        let origin = match &op.kind {
            OperandKind::Const { .. } => Origin::Constant,
            OperandKind::InPin {
                binding: Some(b), ..
            } => {
                node.children.push(self.explain_node(*b, bit, tick, next)?);
                Origin::Binding
            }
            OperandKind::InPin { binding: None, .. } => {
                if self.is_forced(id, tick) {
                    Origin::Forced
                } else {
                    Origin::Floating
                }
            }
            OperandKind::Field { .. } => {
                let (target, target_bit) = design.forward(id, bit);
                node.children
                    .push(self.explain_node(target, target_bit, tick, next)?);
                Origin::Slice
            }
            OperandKind::OutPin { .. } | OperandKind::Wire { .. } => {
                for w in op.covering_writers(abs) {
                    let child = self.explain_node(w.source, w.range.offset(abs), tick, next)?;
                    node.children.push(child);
                }
                Origin::Writers
            }
            OperandKind::Driven { logic, .. } => match logic {
                DriveLogic::Gate {
                    func,
                    inputs,
                    open_collector,
                } => {
                    for &input in inputs {
                        node.children.push(self.explain_node(input, bit, tick, next)?);
                    }
                    Origin::Gate {
                        func: *func,
                        open_collector: *open_collector,
                    }
                }
                DriveLogic::Register { clk, d } => {
                    if tick == 0 {
                        Origin::Reset
                    } else {
                        let edge = self.rose(*clk, tick)?;
                        let source = if edge { *d } else { id };
                        node.children
                            .push(self.explain_node(source, bit, tick - 1, next)?);
                        Origin::Register { edge }
                    }
                }
            },
        };
        node.origin = origin;

        if let Some((up, down)) = self.pulled(id) {
            if (up | down) >> bit & 1 == 1 && self.raw_lanes(id, tick, bit, 1)?.lane(0) == Logic::Z {
                node.origin = Origin::Pulled {
                    up: up >> bit & 1 == 1,
                };
            }
        }
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SimOptions;
    use copper_diagnostics::DiagnosticSink;
    use copper_elaborate::elaborate;
    use copper_ir::ast::DesignSource;
    use copper_ir::Design;

    fn design(json: &str) -> Design {
        let source = DesignSource::from_json(json).unwrap();
        let sink = DiagnosticSink::new();
        let design = elaborate(&source, "top", &sink);
        assert!(!sink.has_errors(), "{:?}", sink.diagnostics());
        design
    }

    const PULLED_AND: &str = r#"{"modules": [{"name": "top", "params": [
        {"name": "a", "direction": "in", "range": {"hi": 1, "lo": 0}},
        {"name": "y", "direction": "out"}], "items": [
        {"kind": "instance", "module": "pullup", "name": "pu",
         "config": [{"kind": "int", "value": 2}],
         "args": [{"kind": "ref", "name": "a"}]},
        {"kind": "instance", "module": "and", "name": "g",
         "args": [{"kind": "slice", "name": "a", "hi": 0, "lo": 0},
                  {"kind": "slice", "name": "a", "hi": 1, "lo": 1},
                  {"kind": "ref", "name": "y"}]}]}]}"#;

    #[test]
    fn gate_inputs_through_slices_and_pulls() {
        let d = design(PULLED_AND);
        let mut sim = Simulator::new(&d, SimOptions::default());
        let a = sim.resolve("a").unwrap();
        let y = sim.resolve("y").unwrap();
        sim.force_rail(a, 0, copper_common::Rail::from_planes(0, 0b01)).unwrap();

        let tree = sim.explain(y, 0, 0, 16).unwrap();
        assert_eq!(tree.operand, "y");
        assert_eq!(tree.state, Logic::Zero);
        assert_eq!(tree.origin, Origin::Writers);
        let y_g = &tree.children[0];
        assert_eq!(y_g.operand, "y/g");
        let gate = &y_g.children[0];
        assert_eq!(gate.operand, "gate/g");
        assert_eq!(
            gate.origin,
            Origin::Gate {
                func: GateFunc::And,
                open_collector: false
            }
        );
        assert_eq!(gate.children.len(), 2);

        // a/g is bound to a[0], b/g to a[1]
        let a0 = &gate.children[0].children[0].children[0];
        assert_eq!((a0.operand.as_str(), a0.bit), ("a", 0));
        assert_eq!(a0.origin, Origin::Forced);
        assert_eq!(a0.state, Logic::Zero);
        let a1 = &gate.children[1].children[0].children[0];
        assert_eq!((a1.operand.as_str(), a1.bit), ("a", 1));
        assert_eq!(a1.origin, Origin::Pulled { up: true });
        assert_eq!(a1.state, Logic::One);
    }

    #[test]
    fn depth_limit_truncates() {
        let d = design(PULLED_AND);
        let mut sim = Simulator::new(&d, SimOptions::default());
        let y = sim.resolve("y").unwrap();
        let tree = sim.explain(y, 0, 0, 1).unwrap();
        assert_eq!(tree.node_count(), 2);
        assert_eq!(tree.children[0].origin, Origin::Truncated);
        let root_only = sim.explain(y, 0, 0, 0).unwrap();
        assert_eq!(root_only.node_count(), 1);
        assert!(matches!(
            sim.explain(y, 1, 0, 4),
            Err(SimError::BitOutOfRange { bit: 1, .. })
        ));
    }

    #[test]
    fn registers_look_one_tick_back() {
        let d = design(
            r#"{"modules": [{"name": "top", "params": [
                {"name": "clk", "direction": "in"},
                {"name": "d", "direction": "in"},
                {"name": "q", "direction": "out"}], "items": [
                {"kind": "instance", "module": "reg", "name": "ff",
                 "args": [{"kind": "ref", "name": "clk"}, {"kind": "ref", "name": "d"}, {"kind": "ref", "name": "q"}]}]}]}"#,
        );
        let mut sim = Simulator::new(&d, SimOptions::default());
        let (clk, data, q) = (
            sim.resolve("clk").unwrap(),
            sim.resolve("d").unwrap(),
            sim.resolve("q").unwrap(),
        );
        sim.force(clk, 0, 0).unwrap();
        sim.force(clk, 1, 1).unwrap();
        sim.force(data, 0, 1).unwrap();

        let tree = sim.explain(q, 0, 2, 8).unwrap();
        let reg = &tree.children[0].children[0];
        assert_eq!(reg.operand, "reg/ff");
        assert_eq!(reg.origin, Origin::Register { edge: false });
        let held = &reg.children[0];
        assert_eq!((held.operand.as_str(), held.tick), ("reg/ff", 1));
        assert_eq!(held.origin, Origin::Register { edge: true });
        assert_eq!(held.state, Logic::One);
        let sampled = &held.children[0];
        assert_eq!((sampled.operand.as_str(), sampled.tick), ("d/ff", 0));
        assert_eq!(held.children[0].children[0].origin, Origin::Forced);
        assert_eq!(held.children[0].children[0].children.len(), 0);

        let text = tree.to_string();
        assert!(text.starts_with("q[0] @2 = 1  writers\n"));
        assert!(text.contains("\n      reg/ff[0] @1 = 1  register, clock edge\n"));
    }
}
