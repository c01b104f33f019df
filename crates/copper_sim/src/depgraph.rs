//! Static bit dependency graph and the combinational-loop preflight.
//!
//! Nodes are single bits of operands. Edges run from a bit to the bits
//! computed from it at the same tick. A register reads its `d` and its own
//! output one tick back, so only its clock lane is an edge; cycles through
//! `d` are broken by the register.

use copper_ir::{Design, DriveLogic, OperandId, OperandKind};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::error::Halt;

/// Bits whose value at a tick feeds bit `bit` (0-based) of `id` at the same tick.
pub fn same_tick_inputs(design: &Design, id: OperandId, bit: u32) -> Vec<(OperandId, u32)> {
    let op = design.operand(id);
    match &op.kind {
        OperandKind::Const { .. } | OperandKind::InPin { binding: None, .. } => Vec::new(),
        OperandKind::InPin {
            binding: Some(b), ..
        } => vec![(*b, bit)],
        OperandKind::Field { .. } => vec![design.forward(id, bit)],
        OperandKind::OutPin { .. } | OperandKind::Wire { .. } => {
            let abs = op.range.abs(bit);
            op.covering_writers(abs)
                .map(|w| (w.source, w.range.offset(abs)))
                .collect()
        }
        OperandKind::Driven { logic, .. } => match logic {
            DriveLogic::Gate { inputs, .. } => inputs.iter().map(|&input| (input, bit)).collect(),
            DriveLogic::Register { clk, .. } => vec![(*clk, 0)],
        },
    }
}

/// Index of lane 0 of every operand; lane `b` follows at `+ b`.
fn lane_bases(design: &Design) -> Vec<usize> {
    let mut next = 0;
    design
        .operands()
        .values()
        .map(|op| {
            let base = next;
            next += op.width() as usize;
            base
        })
        .collect()
}

/// Builds the same-tick dependency graph, one node per operand bit.
pub fn build(design: &Design) -> DiGraph<(OperandId, u32), ()> {
    let bases = lane_bases(design);
    let node = |(id, bit): (OperandId, u32)| NodeIndex::new(bases[id.as_raw() as usize] + bit as usize);
    let mut graph = DiGraph::new();
    for id in design.operands().ids() {
        for bit in 0..design.operand(id).width() {
            graph.add_node((id, bit));
        }
    }
    for id in design.operands().ids() {
        for bit in 0..design.operand(id).width() {
            for input in same_tick_inputs(design, id, bit) {
                graph.add_edge(node(input), node((id, bit)), ());
            }
        }
    }
    graph
}

/// Every cycle of the graph, as its member operands in id order.
pub fn find_loops(design: &Design) -> Vec<Vec<OperandId>> {
    let graph = build(design);
    let mut loops: Vec<Vec<OperandId>> = tarjan_scc(&graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
        .map(|scc| {
            let mut ids: Vec<_> = scc.into_iter().map(|n| graph[n].0).collect();
            ids.sort();
            ids.dedup();
            ids
        })
        .collect();
    loops.sort();
    loops
}

/// Fails with the first loop found, if any.
pub fn preflight(design: &Design) -> Result<(), Halt> {
    match find_loops(design).into_iter().next() {
        None => Ok(()),
        Some(ids) => {
            let mut operands: Vec<String> =
                ids.into_iter().map(|id| design.name(id).to_string()).collect();
            operands.sort();
            log::debug!("static loop through {} operands", operands.len());
            Err(Halt::StaticLoop { operands })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use copper_diagnostics::DiagnosticSink;
    use copper_elaborate::elaborate;
    use copper_ir::ast::DesignSource;

    fn design(json: &str) -> Design {
        let source = DesignSource::from_json(json).unwrap();
        let sink = DiagnosticSink::new();
        let design = elaborate(&source, "top", &sink);
        assert!(!sink.has_errors(), "{:?}", sink.diagnostics());
        design
    }

    #[test]
    fn ring_of_inverters_is_a_loop() {
        let d = design(
            r#"{"modules": [{"name": "top", "params": [], "items": [
                {"kind": "wire", "name": "a"},
                {"kind": "wire", "name": "b"},
                {"kind": "instance", "module": "not", "name": "i1",
                 "args": [{"kind": "ref", "name": "a"}, {"kind": "ref", "name": "b"}]},
                {"kind": "instance", "module": "not", "name": "i2",
                 "args": [{"kind": "ref", "name": "b"}, {"kind": "ref", "name": "a"}]}]}]}"#,
        );
        let loops = find_loops(&d);
        assert_eq!(loops.len(), 1);
        let Err(Halt::StaticLoop { operands }) = preflight(&d) else {
            panic!("expected a loop");
        };
        assert!(operands.contains(&"a".to_string()));
        assert!(operands.contains(&"b".to_string()));
        assert!(operands.contains(&"gate/i1".to_string()));
    }

    #[test]
    fn register_breaks_the_cycle() {
        let d = design(
            r#"{"modules": [{"name": "top", "params": [
                {"name": "clk", "direction": "in"},
                {"name": "q", "direction": "out"}], "items": [
                {"kind": "wire", "name": "nq"},
                {"kind": "instance", "module": "not", "name": "inv",
                 "args": [{"kind": "ref", "name": "q"}, {"kind": "ref", "name": "nq"}]},
                {"kind": "instance", "module": "reg", "name": "ff",
                 "args": [{"kind": "ref", "name": "clk"}, {"kind": "ref", "name": "nq"}, {"kind": "ref", "name": "q"}]}]}]}"#,
        );
        assert!(find_loops(&d).is_empty());
        assert_eq!(preflight(&d), Ok(()));
    }

    #[test]
    fn edges_follow_writers_and_bindings() {
        let d = design(
            r#"{"modules": [{"name": "top", "params": [
                {"name": "a", "direction": "in"},
                {"name": "y", "direction": "out"}], "items": [
                {"kind": "instance", "module": "buf", "name": "u",
                 "args": [{"kind": "ref", "name": "a"}, {"kind": "ref", "name": "y"}]}]}]}"#,
        );
        let graph = build(&d);
        let bits: u32 = d.operands().values().map(|op| op.width()).sum();
        assert_eq!(graph.node_count(), bits as usize);
        let a = d.find("a").unwrap();
        let pin = d.find("a/u").unwrap();
        let y = d.find("y").unwrap();
        let index = |bit| graph.node_indices().find(|&n| graph[n] == bit).unwrap();
        assert!(graph.contains_edge(index((a, 0)), index((pin, 0))));
        assert_eq!(same_tick_inputs(&d, y, 0), vec![(d.find("y/u").unwrap(), 0)]);
    }

    #[test]
    fn bus_feeding_its_own_bits_is_not_a_loop() {
        // q[1] = not q[0], q[0] = a
        let d = design(
            r#"{"modules": [{"name": "top", "params": [
                {"name": "a", "direction": "in"},
                {"name": "q", "direction": "out", "range": {"hi": 1, "lo": 0}}], "items": [
                {"kind": "assign", "target": {"kind": "slice", "name": "q", "hi": 0, "lo": 0},
                 "value": {"kind": "ref", "name": "a"}},
                {"kind": "instance", "module": "not", "name": "i",
                 "args": [{"kind": "slice", "name": "q", "hi": 0, "lo": 0},
                          {"kind": "slice", "name": "q", "hi": 1, "lo": 1}]}]}]}"#,
        );
        assert!(find_loops(&d).is_empty());
        assert_eq!(preflight(&d), Ok(()));
    }

    #[test]
    fn self_clocked_register_is_a_loop() {
        let d = design(
            r#"{"modules": [{"name": "top", "params": [
                {"name": "d", "direction": "in"},
                {"name": "q", "direction": "out"}], "items": [
                {"kind": "instance", "module": "reg", "name": "ff",
                 "args": [{"kind": "ref", "name": "q"}, {"kind": "ref", "name": "d"}, {"kind": "ref", "name": "q"}]}]}]}"#,
        );
        let loops = find_loops(&d);
        assert_eq!(loops.len(), 1);
        assert!(loops[0].contains(&d.find("reg/ff").unwrap()));
    }
}
