//! Electrical nodes and wired-AND merging.
//!
//! A [`Network`] owns the pin connections made directly to it. A wired-AND
//! network additionally owns subnets: the networks of the drivers merged
//! onto an open-collector bus. Merging never copies connections; enumeration
//! walks the subnet tree instead.

use crate::arena::Arena;
use crate::ids::{ComponentId, NetworkId};
use std::collections::HashMap;

/// What a connection attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Endpoint {
    /// A placed component.
    Component(ComponentId),
    /// The top-level connector.
    Connector,
}

/// One pin attached to a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Conn {
    /// Component or connector.
    pub endpoint: Endpoint,
    /// 1-based pin number.
    pub pin: u16,
}

/// Plain node or wired-AND merge node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetKind {
    /// Ordinary node.
    Plain,
    /// Open-collector bus.
    WiredAnd {
        /// Merged driver networks, in merge order.
        subnets: Vec<NetworkId>,
    },
}

/// A named electrical node.
#[derive(Debug, Clone)]
pub struct Network {
    /// Unique name.
    pub name: String,
    /// Node kind.
    pub kind: NetKind,
    /// Net code assigned after generation; 0 until then.
    pub code: u32,
    conns: Vec<Conn>,
    parent: Option<NetworkId>,
}

impl Network {
    /// Connections made directly to this node.
    pub fn own_conns(&self) -> &[Conn] {
        &self.conns
    }

    /// Merged subnets; empty for plain nodes.
    pub fn subnets(&self) -> &[NetworkId] {
        match &self.kind {
            NetKind::WiredAnd { subnets } => subnets,
            NetKind::Plain => &[],
        }
    }

    /// The wired-AND this node was merged into, if any.
    pub fn parent(&self) -> Option<NetworkId> {
        self.parent
    }
}

/// All networks of one generation pass, unique by name.
#[derive(Debug, Default)]
pub struct Networks {
    arena: Arena<NetworkId, Network>,
    by_name: HashMap<String, NetworkId>,
}

impl Networks {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a network.
    ///
    /// # Panics
    ///
    /// Panics if a network with this name already exists.
    pub fn register(&mut self, name: impl Into<String>, kind: NetKind) -> NetworkId {
        let name = name.into();
        assert!(
            !self.by_name.contains_key(&name),
            "duplicate net registration `{name}`"
        );
        let id = self.arena.alloc(Network {
            name: name.clone(),
            kind,
            code: 0,
            conns: Vec::new(),
            parent: None,
        });
        self.by_name.insert(name, id);
        id
    }

    /// Looks up a network by name.
    pub fn lookup(&self, name: &str) -> Option<NetworkId> {
        self.by_name.get(name).copied()
    }

    /// Returns a network.
    pub fn get(&self, id: NetworkId) -> &Network {
        &self.arena[id]
    }

    /// Returns a network mutably.
    pub fn get_mut(&mut self, id: NetworkId) -> &mut Network {
        &mut self.arena[id]
    }

    /// Number of networks, merged ones included.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Returns `true` if no network exists.
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Iterates over all networks in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (NetworkId, &Network)> {
        self.arena.iter()
    }

    /// Iterates over networks not merged into another, in creation order.
    pub fn roots(&self) -> impl Iterator<Item = (NetworkId, &Network)> {
        self.arena.iter().filter(|(_, n)| n.parent.is_none())
    }

    /// Attaches a pin to a network.
    pub fn connect(&mut self, id: NetworkId, conn: Conn) {
        self.arena[id].conns.push(conn);
    }

    /// Top of the merge tree containing `id`.
    pub fn root(&self, mut id: NetworkId) -> NetworkId {
        while let Some(parent) = self.arena[id].parent {
            id = parent;
        }
        id
    }

    /// Merges the tree containing `driver` into the tree containing `wand`.
    ///
    /// The driver's root is attached under the wired-AND's root, so every
    /// network keeps at most one parent and the structure stays a tree even
    /// when buses drive each other. Merging a tree into itself does nothing.
    ///
    /// # Panics
    ///
    /// Panics if the root of `wand`'s tree is not a wired-AND.
    pub fn add_driver(&mut self, wand: NetworkId, driver: NetworkId) {
        let top = self.root(wand);
        let sub = self.root(driver);
        if top == sub {
            return;
        }
        assert!(
            matches!(self.arena[top].kind, NetKind::WiredAnd { .. }),
            "merging into plain network `{}`",
            self.arena[top].name
        );
        if let NetKind::WiredAnd { subnets } = &mut self.arena[top].kind {
            subnets.push(sub);
        }
        self.arena[sub].parent = Some(top);
    }

    /// Enumerates every connection of `id` and its subnets.
    pub fn conns(&self, id: NetworkId) -> ConnIter<'_> {
        ConnIter {
            arena: &self.arena,
            stack: vec![Frame {
                net: id,
                conn: 0,
                sub: 0,
            }],
        }
    }
}

struct Frame {
    net: NetworkId,
    conn: usize,
    sub: usize,
}

/// Lazy pre-order walk over a network's connections.
///
/// Yields the node's own connections, then each subnet's connections
/// recursively, in merge order.
pub struct ConnIter<'a> {
    arena: &'a Arena<NetworkId, Network>,
    stack: Vec<Frame>,
}

impl Iterator for ConnIter<'_> {
    type Item = Conn;

    fn next(&mut self) -> Option<Conn> {
        let arena = self.arena;
        loop {
            let frame = self.stack.last_mut()?;
            let net = &arena[frame.net];
            if let Some(conn) = net.conns.get(frame.conn) {
                frame.conn += 1;
                return Some(*conn);
            }
            if let Some(&sub) = net.subnets().get(frame.sub) {
                frame.sub += 1;
                self.stack.push(Frame {
                    net: sub,
                    conn: 0,
                    sub: 0,
                });
                continue;
            }
            self.stack.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(component: u32, pin: u16) -> Conn {
        Conn {
            endpoint: Endpoint::Component(ComponentId::from_raw(component)),
            pin,
        }
    }

    fn wand() -> NetKind {
        NetKind::WiredAnd {
            subnets: Vec::new(),
        }
    }

    #[test]
    #[should_panic(expected = "duplicate net registration")]
    fn duplicate_name_panics() {
        let mut nets = Networks::new();
        nets.register("GND", NetKind::Plain);
        nets.register("GND", NetKind::Plain);
    }

    #[test]
    fn plain_enumeration_keeps_order() {
        let mut nets = Networks::new();
        let n = nets.register("a", NetKind::Plain);
        nets.connect(n, conn(0, 1));
        nets.connect(n, conn(1, 2));
        let all: Vec<_> = nets.conns(n).collect();
        assert_eq!(all, vec![conn(0, 1), conn(1, 2)]);
    }

    #[test]
    fn nested_wired_enumeration_is_preorder() {
        let mut nets = Networks::new();
        let bus = nets.register("bus", wand());
        let inner = nets.register("inner", wand());
        let d1 = nets.register("d1", NetKind::Plain);
        let d2 = nets.register("d2", NetKind::Plain);
        let d3 = nets.register("d3", NetKind::Plain);
        nets.connect(bus, conn(0, 1));
        nets.connect(inner, conn(1, 1));
        nets.connect(d1, conn(2, 1));
        nets.connect(d2, conn(3, 1));
        nets.connect(d3, conn(4, 1));
        nets.connect(d3, conn(4, 2));

        nets.add_driver(inner, d2);
        nets.add_driver(bus, d1);
        nets.add_driver(bus, inner);
        nets.add_driver(bus, d3);

        let all: Vec<_> = nets.conns(bus).collect();
        assert_eq!(
            all,
            vec![
                conn(0, 1),
                conn(2, 1),
                conn(1, 1),
                conn(3, 1),
                conn(4, 1),
                conn(4, 2)
            ]
        );
        let unique: std::collections::HashSet<_> = all.iter().collect();
        assert_eq!(unique.len(), all.len());
        assert_eq!(nets.roots().count(), 1);
    }

    #[test]
    fn merging_a_tree_into_itself_is_a_noop() {
        let mut nets = Networks::new();
        let bus = nets.register("bus", wand());
        let d = nets.register("d", NetKind::Plain);
        nets.add_driver(bus, d);
        nets.add_driver(bus, d);
        nets.add_driver(bus, bus);
        assert_eq!(nets.get(bus).subnets(), &[d]);
        assert_eq!(nets.root(d), bus);
    }

    #[test]
    fn buses_feeding_each_other_stay_acyclic() {
        let mut nets = Networks::new();
        let a = nets.register("a", wand());
        let b = nets.register("b", wand());
        nets.add_driver(a, b);
        nets.add_driver(b, a);
        assert_eq!(nets.root(a), a);
        assert_eq!(nets.root(b), a);
        assert!(nets.get(b).subnets().is_empty());
        assert_eq!(nets.conns(a).count(), 0);
    }

    #[test]
    fn driver_shared_by_two_buses_joins_them() {
        let mut nets = Networks::new();
        let a = nets.register("a", wand());
        let b = nets.register("b", wand());
        let d = nets.register("d", NetKind::Plain);
        nets.connect(d, conn(9, 3));
        nets.add_driver(a, d);
        nets.add_driver(b, d);
        assert_eq!(nets.root(d), b);
        assert_eq!(nets.root(a), b);
        assert_eq!(nets.conns(b).collect::<Vec<_>>(), vec![conn(9, 3)]);
    }
}
