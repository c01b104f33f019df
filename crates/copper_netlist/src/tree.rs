//! Hierarchical grouping of flattened components.
//!
//! Component names end with the suffix of the instance that created them,
//! innermost instance first (`gate/u1/cpu`). At a given instance path, a
//! component whose name minus the path has no `/` left belongs to that
//! instance directly; any other component belongs to the child instance
//! named by the last remaining segment.

use std::collections::BTreeMap;

use copper_ir::{Arena, Component, ComponentId};

/// Components of one instance, and its child instances by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentTree {
    /// Instance path; `""` for the top.
    pub path: String,
    /// Components created by this instance, in creation order.
    pub direct: Vec<ComponentId>,
    /// Child instances.
    pub children: BTreeMap<String, ComponentTree>,
}

impl ComponentTree {
    /// Builds the tree of every component.
    pub fn build(components: &Arena<ComponentId, Component>) -> Self {
        let ids: Vec<_> = components.ids().collect();
        Self::build_at(components, &ids, String::new())
    }

    fn build_at(
        components: &Arena<ComponentId, Component>,
        ids: &[ComponentId],
        path: String,
    ) -> Self {
        let mut direct = Vec::new();
        let mut grouped: BTreeMap<String, Vec<ComponentId>> = BTreeMap::new();
        for &id in ids {
            let local = local_name(&components[id].name, &path);
            match local.rfind('/') {
                None => direct.push(id),
                Some(slash) => grouped
                    .entry(local[slash + 1..].to_string())
                    .or_default()
                    .push(id),
            }
        }
        let children = grouped
            .into_iter()
            .map(|(key, ids)| {
                let child_path = format!("/{key}{path}");
                (key, Self::build_at(components, &ids, child_path))
            })
            .collect();
        Self {
            path,
            direct,
            children,
        }
    }

    /// Number of components in this subtree.
    pub fn len(&self) -> usize {
        self.direct.len() + self.children.values().map(ComponentTree::len).sum::<usize>()
    }

    /// Returns `true` if the subtree holds no component.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A component's name with the instance path removed.
fn local_name<'a>(name: &'a str, path: &str) -> &'a str {
    name.strip_suffix(path).unwrap_or(name)
}

/// Display label of a component directly under `path`.
///
/// The dotted segments of the local name are listed most specific first:
/// `pull.3` becomes `3.pull`.
pub fn label(name: &str, path: &str) -> String {
    let local = local_name(name, path);
    local.rsplit('.').collect::<Vec<_>>().join(".")
}
