//! Design-source-to-IR elaboration.
//!
//! Expands the module hierarchy of a parsed [`DesignSource`] into a flat
//! [`Design`]: every parameter and wire of every instance becomes a renamed
//! operand, built-in modules add their parts, and every writable operand's
//! writers are validated before the design is handed to generation or
//! simulation.
//!
//! # Usage
//!
//! ```ignore
//! let design = elaborate(&source, "top", &sink);
//! ```

#![warn(missing_docs)]

pub mod builtins;
pub mod context;
pub mod errors;
pub mod expr;
pub mod instantiate;
pub mod registry;

use copper_diagnostics::DiagnosticSink;
use copper_ir::ast::DesignSource;
use copper_ir::Design;

use context::ElaborationContext;
use registry::ModuleRegistry;

/// Elaborates `source` with `top` as the top-level module.
///
/// User-facing problems are emitted to `sink` and the offending item is
/// skipped, so the returned design is always usable for further checks.
/// A missing top module yields an empty design.
pub fn elaborate(source: &DesignSource, top: &str, sink: &DiagnosticSink) -> Design {
    let registry = ModuleRegistry::new(source, sink);
    let mut ctx = ElaborationContext::new(&registry, sink);

    let Some(decl) = registry.source_module(top) else {
        sink.emit(errors::error_top_not_found(top));
        return ctx.design;
    };

    ctx.push_elab_stack(&decl.name);
    let instance = instantiate::instantiate_source(&mut ctx, decl, "", true);
    ctx.pop_elab_stack();
    ctx.design.set_ports(instance.params);

    validate(&mut ctx.design, sink);
    log::debug!(
        "elaborated `{top}`: {} operands, {} parts",
        ctx.design.operands().len(),
        ctx.design.parts().len()
    );
    ctx.design
}

/// Validates the writers of every writable operand.
///
/// Overlapping writers on a non-wired operand are an error and leave the
/// operand unvalidated; undriven bits of a non-wired operand are a warning.
pub fn validate(design: &mut Design, sink: &DiagnosticSink) {
    let ids: Vec<_> = design.operands().ids().collect();
    for id in ids {
        if !design.operand(id).is_writable() {
            continue;
        }
        match design.check_writers(id) {
            Ok(gaps) => {
                let op = design.operand(id);
                if op.is_wired() {
                    continue;
                }
                for gap in gaps {
                    sink.emit(errors::warn_undriven(design.name(id), gap, op.span));
                }
            }
            Err(err) => sink.emit(errors::error_overlap(&err, design.operand(id).span)),
        }
    }
}
