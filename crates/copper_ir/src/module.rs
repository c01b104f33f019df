//! Per-instance variable tables and parameter arrays.

use crate::design::Design;
use crate::ids::OperandId;
use copper_common::Ident;
use std::collections::HashMap;

/// Maps local (unsuffixed) names to the instance's operand copies.
#[derive(Debug, Default)]
pub struct Scope {
    vars: HashMap<Ident, OperandId>,
}

impl Scope {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a local name.
    ///
    /// # Panics
    ///
    /// Panics if the name is already registered. Source-level duplicates are
    /// rejected before registration.
    pub fn register(&mut self, name: Ident, id: OperandId) {
        let previous = self.vars.insert(name, id);
        assert!(previous.is_none(), "variable registered twice");
    }

    /// Looks up a local name.
    pub fn lookup(&self, name: Ident) -> Option<OperandId> {
        self.vars.get(&name).copied()
    }

    /// Number of registered names.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// One instantiated module: its parameter slots and variables.
#[derive(Debug)]
pub struct Instance {
    /// Module name.
    pub module: String,
    /// Instance suffix appended to every name (`""` for the top).
    pub suffix: String,
    /// Operand occupying each parameter slot, in declaration order.
    pub params: Vec<OperandId>,
    /// Variable table.
    pub scope: Scope,
}

impl Instance {
    /// Returns `true` if parameter `slot` is an input.
    ///
    /// A slot is an input exactly when its operand cannot be written.
    pub fn is_inst_param_in(&self, design: &Design, slot: usize) -> bool {
        !design.operand(self.params[slot]).is_writable()
    }
}
