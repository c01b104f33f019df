//! Module name lookup across the built-in library and the design source.

use std::collections::HashMap;

use copper_diagnostics::DiagnosticSink;
use copper_ir::ast::{DesignSource, ModuleDecl};
use copper_source::Span;

use crate::builtins::{standard_library, BuiltinModule};
use crate::errors;

/// A module found by name.
pub enum ModuleEntry<'a> {
    /// Defined in the design source.
    Source(&'a ModuleDecl),
    /// From the built-in library.
    Builtin(&'a dyn BuiltinModule),
}

impl ModuleEntry<'_> {
    /// Number of parameter slots.
    pub fn param_count(&self) -> usize {
        match self {
            ModuleEntry::Source(decl) => decl.params.len(),
            ModuleEntry::Builtin(module) => module.params().len(),
        }
    }
}

/// Every module available to instance items.
///
/// A source module may not reuse the name of another source module or of a
/// built-in; the first definition wins and later ones are reported.
pub struct ModuleRegistry<'a> {
    builtins: HashMap<&'static str, Box<dyn BuiltinModule>>,
    source: HashMap<&'a str, &'a ModuleDecl>,
}

impl<'a> ModuleRegistry<'a> {
    /// Builds the registry, emitting `E101` for duplicate names.
    pub fn new(design: &'a DesignSource, sink: &DiagnosticSink) -> Self {
        let mut reg = Self {
            builtins: HashMap::new(),
            source: HashMap::new(),
        };
        for module in standard_library() {
            reg.add_builtin(module);
        }
        for decl in &design.modules {
            if reg.builtins.contains_key(decl.name.as_str()) {
                sink.emit(errors::error_duplicate_module(&decl.name, decl.span, Span::DUMMY));
                continue;
            }
            if let Some(prev) = reg.source.get(decl.name.as_str()) {
                sink.emit(errors::error_duplicate_module(&decl.name, decl.span, prev.span));
                continue;
            }
            reg.source.insert(&decl.name, decl);
        }
        reg
    }

    /// Adds a built-in module, replacing one of the same name.
    pub fn add_builtin(&mut self, module: Box<dyn BuiltinModule>) {
        self.builtins.insert(module.name(), module);
    }

    /// Finds a module by name.
    pub fn lookup(&self, name: &str) -> Option<ModuleEntry<'_>> {
        if let Some(decl) = self.source.get(name) {
            return Some(ModuleEntry::Source(decl));
        }
        self.builtins
            .get(name)
            .map(|module| ModuleEntry::Builtin(module.as_ref()))
    }

    /// Finds a source module by name.
    pub fn source_module(&self, name: &str) -> Option<&'a ModuleDecl> {
        self.source.get(name).copied()
    }
}
