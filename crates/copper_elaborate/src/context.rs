//! Mutable elaboration state.

use copper_diagnostics::DiagnosticSink;
use copper_ir::Design;

use crate::registry::ModuleRegistry;

/// State carried through recursive instantiation.
///
/// Owns the [`Design`] being built and the stack of modules currently being
/// instantiated, used to detect recursion.
pub struct ElaborationContext<'a> {
    /// The design being built.
    pub design: Design,
    /// Module lookup.
    pub registry: &'a ModuleRegistry<'a>,
    /// Where diagnostics go.
    pub sink: &'a DiagnosticSink,
    elab_stack: Vec<String>,
}

impl<'a> ElaborationContext<'a> {
    /// Creates a context with an empty design.
    pub fn new(registry: &'a ModuleRegistry<'a>, sink: &'a DiagnosticSink) -> Self {
        Self {
            design: Design::new(),
            registry,
            sink,
            elab_stack: Vec::new(),
        }
    }

    /// Pushes a module being instantiated.
    ///
    /// Returns `false` if the module is already on the stack.
    pub fn push_elab_stack(&mut self, module: &str) -> bool {
        if self.elab_stack.iter().any(|m| m == module) {
            return false;
        }
        self.elab_stack.push(module.to_string());
        true
    }

    /// Pops the innermost module.
    pub fn pop_elab_stack(&mut self) {
        self.elab_stack.pop();
    }

    /// Current instantiation depth.
    pub fn depth(&self) -> usize {
        self.elab_stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use copper_ir::ast::DesignSource;

    #[test]
    fn elab_stack_detects_cycles() {
        let src = DesignSource::default();
        let sink = DiagnosticSink::new();
        let registry = ModuleRegistry::new(&src, &sink);
        let mut ctx = ElaborationContext::new(&registry, &sink);
        assert!(ctx.push_elab_stack("top"));
        assert!(ctx.push_elab_stack("counter"));
        assert!(!ctx.push_elab_stack("top"));
        assert_eq!(ctx.depth(), 2);
        ctx.pop_elab_stack();
        ctx.pop_elab_stack();
        assert!(ctx.push_elab_stack("top"));
    }
}
