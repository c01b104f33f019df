//! Reference designators and net codes.
//!
//! Both are assigned after generation so that a legacy netlist can keep
//! them stable: a component whose timestamp the legacy netlist knows gets
//! its old reference back when that reference is still free, and a net
//! keeps its old code. Everything else is numbered after what is taken.

use std::collections::{BTreeMap, HashSet};

use copper_ir::{Arena, Component, ComponentId, Connector, Networks};

use crate::legacy::LegacyNetlist;

/// Assigns a reference designator to every component.
///
/// The connector's reference is taken first. Legacy references are honoured
/// in creation order; a reference already taken is dropped and the
/// component numbered like a new one.
pub fn assign_references(
    components: &mut Arena<ComponentId, Component>,
    connector: &Connector,
    legacy: Option<&LegacyNetlist>,
) {
    let mut taken: HashSet<String> = HashSet::new();
    taken.insert(connector.reference.clone());

    let mut pending = Vec::new();
    let ids: Vec<_> = components.ids().collect();
    for id in ids {
        let component = &mut components[id];
        let old = legacy.and_then(|l| l.refs.get(&component.timestamp.to_string()));
        match old {
            Some(reference)
                if reference.starts_with(component.prefix) && !taken.contains(reference) =>
            {
                taken.insert(reference.clone());
                component.reference = reference.clone();
            }
            _ => pending.push(id),
        }
    }

    let mut next: BTreeMap<&str, u32> = BTreeMap::new();
    for id in pending {
        let component = &mut components[id];
        let counter = next.entry(component.prefix).or_insert(1);
        loop {
            let candidate = format!("{}{}", component.prefix, *counter);
            *counter += 1;
            if taken.insert(candidate.clone()) {
                log::trace!("{} is {candidate}", component.name);
                component.reference = candidate;
                break;
            }
        }
    }
}

/// Assigns a code to every network not merged into another.
///
/// Legacy codes are honoured by net name; new nets are numbered after the
/// largest legacy code in creation order.
pub fn assign_net_codes(networks: &mut Networks, legacy: Option<&LegacyNetlist>) {
    let roots: Vec<_> = networks.roots().map(|(id, _)| id).collect();
    let mut used: HashSet<u32> = HashSet::new();
    let mut fresh = Vec::new();
    for id in roots {
        let net = networks.get_mut(id);
        match legacy.and_then(|l| l.codes.get(&net.name)) {
            Some(&code) if used.insert(code) => net.code = code,
            _ => fresh.push(id),
        }
    }
    let mut next = used.iter().copied().max().unwrap_or(0) + 1;
    for id in fresh {
        networks.get_mut(id).code = next;
        next += 1;
    }
}
