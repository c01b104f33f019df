//! Text rendering of a generated netlist.
//!
//! The listing has one section per instance level: the instance's own
//! components, then its child instances indented below it. Each line shows
//! the reference, the label, the value and the position three ways: native
//! units, millimetres and the stored grid coordinate. The net list follows,
//! ordered by net code; nets without connections are left out.

use std::fmt::Write;

use copper_ir::{Endpoint, Placeable, GRID};

use crate::tree::{label, ComponentTree};
use crate::Netlist;

/// Millimetres per native unit.
const MM_PER_UNIT: f64 = 2.54;

struct Row {
    indent: usize,
    reference: String,
    label: String,
    value: String,
    position: (i32, i32),
    flipped: bool,
}

fn native(grid: i32) -> f64 {
    grid as f64 / GRID as f64
}

fn collect_rows(netlist: &Netlist, tree: &ComponentTree, depth: usize, rows: &mut Vec<Row>) {
    for &id in &tree.direct {
        let c = &netlist.components[id];
        rows.push(Row {
            indent: depth,
            reference: c.reference.clone(),
            label: label(&c.name, &tree.path),
            value: c.value.clone(),
            position: c.position(),
            flipped: c.is_flipped(),
        });
    }
    for (name, child) in &tree.children {
        rows.push(Row {
            indent: depth,
            reference: String::new(),
            label: format!("{name}:"),
            value: String::new(),
            position: (0, 0),
            flipped: false,
        });
        collect_rows(netlist, child, depth + 1, rows);
    }
}

/// Renders the component listing and the net list.
pub fn render(netlist: &Netlist) -> String {
    let connector = &netlist.connector;
    let mut rows = vec![Row {
        indent: 0,
        reference: connector.reference.clone(),
        label: "connector".to_string(),
        value: format!("{}-pin", connector.pins.len()),
        position: connector.position(),
        flipped: connector.is_flipped(),
    }];
    let tree = ComponentTree::build(&netlist.components);
    collect_rows(netlist, &tree, 0, &mut rows);

    let ref_width = rows.iter().map(|r| r.indent * 2 + r.reference.len()).max().unwrap_or(0);
    let label_width = rows.iter().map(|r| r.label.len()).max().unwrap_or(0);
    let value_width = rows.iter().map(|r| r.value.len()).max().unwrap_or(0);

    let mut out = String::new();
    for row in &rows {
        let indent = "  ".repeat(row.indent);
        if row.reference.is_empty() && row.value.is_empty() {
            let _ = writeln!(out, "{indent}{}", row.label);
            continue;
        }
        let (x, y) = row.position;
        let reference = format!("{indent}{}", row.reference);
        let _ = write!(
            out,
            "{reference:<ref_width$}  {:<label_width$}  {:<value_width$}  ({:.2}, {:.2})  ({:.2}mm, {:.2}mm)  [{x}, {y}]",
            row.label,
            row.value,
            native(x),
            native(y),
            native(x) * MM_PER_UNIT,
            native(y) * MM_PER_UNIT,
        );
        if row.flipped {
            out.push_str("  flipped");
        }
        out.push('\n');
    }

    out.push_str("\nnets:\n");
    let mut nets: Vec<_> = netlist
        .networks
        .roots()
        .map(|(id, net)| {
            let conns: Vec<String> = netlist
                .networks
                .conns(id)
                .map(|conn| format!("{}.{}", netlist.reference(conn.endpoint), conn.pin))
                .collect();
            (net, conns)
        })
        .filter(|(_, conns)| !conns.is_empty())
        .collect();
    nets.sort_by_key(|(net, _)| net.code);
    let name_width = nets.iter().map(|(n, _)| n.name.len()).max().unwrap_or(0);
    for (net, conns) in nets {
        let _ = writeln!(
            out,
            "{:>4}  {:<name_width$}  {}",
            net.code,
            net.name,
            conns.join(" ")
        );
    }
    out
}

impl Netlist {
    /// Reference designator of a connection endpoint.
    pub fn reference(&self, endpoint: Endpoint) -> &str {
        match endpoint {
            Endpoint::Component(id) => &self.components[id].reference,
            Endpoint::Connector => &self.connector.reference,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use copper_ir::{Arena, Component, Conn, Connector, NetKind, Networks, PartId};

    fn sample() -> Netlist {
        let mut components = Arena::new();
        let mut gate = Component::new("gate/u1".into(), PartId::from_raw(0), "U", "nand".into(), 4);
        gate.reference = "U1".into();
        gate.position = (60, 0);
        let gate = components.alloc(gate);
        let mut pull = Component::new("pull.0".into(), PartId::from_raw(1), "R", "10k".into(), 2);
        pull.reference = "R1".into();
        pull.position = (30, 40);
        pull.flipped = true;
        let pull = components.alloc(pull);

        let mut connector = Connector::new("J1");
        connector.add_pin("a");

        let mut networks = Networks::new();
        let gnd = networks.register("GND", NetKind::Plain);
        let a = networks.register("a", NetKind::Plain);
        let idle = networks.register("idle", NetKind::Plain);
        networks.get_mut(gnd).code = 2;
        networks.get_mut(a).code = 1;
        networks.get_mut(idle).code = 3;
        networks.connect(gnd, Conn { endpoint: Endpoint::Component(gate), pin: 3 });
        networks.connect(gnd, Conn { endpoint: Endpoint::Component(pull), pin: 1 });
        networks.connect(a, Conn { endpoint: Endpoint::Component(gate), pin: 1 });
        networks.connect(a, Conn { endpoint: Endpoint::Connector, pin: 1 });

        Netlist {
            networks,
            components,
            connector,
        }
    }

    #[test]
    fn listing_shows_hierarchy_and_units() {
        let text = render(&sample());
        let lines: Vec<_> = text.lines().collect();
        assert!(lines[0].starts_with("J1"));
        assert!(lines[0].contains("1-pin"));
        assert!(lines[1].starts_with("R1"));
        assert!(lines[1].contains("0.pull"));
        assert!(lines[1].contains("(1.50, 2.00)  (3.81mm, 5.08mm)  [30, 40]"));
        assert!(lines[1].ends_with("flipped"));
        assert_eq!(lines[2], "u1:");
        assert!(lines[3].starts_with("  U1"));
        assert!(lines[3].contains("(3.00, 0.00)  (7.62mm, 0.00mm)  [60, 0]"));
    }

    #[test]
    fn nets_are_sorted_by_code_and_empty_ones_skipped() {
        let text = render(&sample());
        let nets: Vec<_> = text.lines().skip_while(|l| *l != "nets:").skip(1).collect();
        assert_eq!(nets, vec!["   1  a    U1.1 J1.1", "   2  GND  U1.3 R1.1"]);
    }
}
