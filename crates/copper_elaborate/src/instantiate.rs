//! Instantiation of source-defined modules.
//!
//! Instantiating module `M` under suffix `S` copies every parameter and wire
//! of `M` as `<name>S`, then elaborates assignments and sub-instances in
//! source order. A child instance `i` gets the suffix `/i` followed by its
//! parent's suffix, so names read innermost-first: `a/g/top_inst`.

use std::collections::HashMap;

use copper_ir::ast::{Direction, Expr, Item, ModuleDecl, RangeDecl};
use copper_ir::{BitRange, Instance, Operand, OperandKind, Scope, Token, TokenStream};
use copper_source::Span;

use crate::context::ElaborationContext;
use crate::errors::{self, ElabError};
use crate::expr::{read_expr, write_expr};
use crate::registry::ModuleEntry;

const RESERVED: [&str; 2] = ["GND", "VCC"];

/// Names declared in one module body, for duplicate detection.
#[derive(Default)]
struct Declared<'d> {
    spans: HashMap<&'d str, Span>,
}

impl<'d> Declared<'d> {
    /// Records a declaration, reporting duplicates and reserved names.
    fn declare(&mut self, ctx: &ElaborationContext<'_>, name: &'d str, span: Span) -> bool {
        if RESERVED.contains(&name) {
            ctx.sink.emit(errors::error_reserved_name(name, span));
            return false;
        }
        if let Some(prev) = self.spans.get(name) {
            ctx.sink
                .emit(errors::error_duplicate_declaration(name, span, *prev));
            return false;
        }
        self.spans.insert(name, span);
        true
    }
}

/// Converts a declared range, reporting reversed or over-wide ranges.
///
/// Invalid ranges fall back to a single bit so the declaration still
/// occupies its slot.
fn declared_range(
    ctx: &ElaborationContext<'_>,
    name: &str,
    range: Option<RangeDecl>,
    span: Span,
) -> BitRange {
    let Some(RangeDecl { hi, lo }) = range else {
        return BitRange::of_width(1);
    };
    match BitRange::new(lo, hi) {
        Some(r) if r.fits() => r,
        Some(r) => {
            ctx.sink.emit(errors::error_too_wide(name, r.width(), span));
            BitRange::of_width(1)
        }
        None => {
            ctx.sink.emit(errors::error_bad_range(name, hi, lo, span));
            BitRange::of_width(1)
        }
    }
}

/// Instantiates a source module under `suffix`.
///
/// Input parameters of the top module (`top == true`) keep their
/// `forceable` flag; instance inputs are bound by the parent and never
/// forceable.
pub fn instantiate_source(
    ctx: &mut ElaborationContext<'_>,
    decl: &ModuleDecl,
    suffix: &str,
    top: bool,
) -> Instance {
    log::debug!("instantiating `{}` as `{}`", decl.name, suffix);
    let mut declared = Declared::default();
    let mut scope = Scope::new();
    let mut params = Vec::with_capacity(decl.params.len());

    for param in &decl.params {
        let fresh = declared.declare(ctx, &param.name, param.span);
        let range = declared_range(ctx, &param.name, param.range, param.span);
        let kind = match param.direction {
            Direction::In => OperandKind::InPin {
                binding: None,
                forceable: top && param.forceable,
            },
            Direction::Out => OperandKind::OutPin {
                writers: Vec::new(),
            },
        };
        let name = ctx.design.interner().suffixed(&param.name, suffix);
        let id = ctx
            .design
            .add_operand(Operand::new(name, range, kind, param.span));
        if fresh {
            scope.register(ctx.design.interner().get_or_intern(&param.name), id);
        }
        params.push(id);
    }

    for item in &decl.items {
        if let Item::Wire {
            name,
            range,
            wired,
            span,
        } = item
        {
            if !declared.declare(ctx, name, *span) {
                continue;
            }
            let range = declared_range(ctx, name, *range, *span);
            let ident = ctx.design.interner().suffixed(name, suffix);
            let id = ctx.design.add_operand(Operand::new(
                ident,
                range,
                OperandKind::Wire {
                    wired: *wired,
                    writers: Vec::new(),
                },
                *span,
            ));
            scope.register(ctx.design.interner().get_or_intern(name), id);
        }
    }

    let mut instances: HashMap<&str, Span> = HashMap::new();
    for item in &decl.items {
        let result = match item {
            Item::Wire { .. } => Ok(()),
            Item::Assign {
                target,
                value,
                span,
            } => elaborate_assign(ctx, &scope, target, value, *span),
            Item::Instance {
                module,
                name,
                config,
                args,
                span,
            } => {
                if let Some(prev) = instances.get(name.as_str()) {
                    ctx.sink
                        .emit(errors::error_duplicate_declaration(name, *span, *prev));
                    continue;
                }
                instances.insert(name.as_str(), *span);
                let child_suffix = format!("/{name}{suffix}");
                elaborate_instance(ctx, &scope, module, &child_suffix, config, args, *span)
            }
        };
        if let Err(err) = result {
            ctx.sink.emit(err.to_diagnostic());
        }
    }

    Instance {
        module: decl.name.clone(),
        suffix: suffix.to_string(),
        params,
        scope,
    }
}

fn elaborate_assign(
    ctx: &mut ElaborationContext<'_>,
    scope: &Scope,
    target: &Expr,
    value: &Expr,
    span: Span,
) -> Result<(), ElabError> {
    let (target, range) = write_expr(ctx, scope, target)?;
    let source = read_expr(ctx, scope, value, Some(range.width()))?;
    ctx.design
        .add_writer(target, range, source, span)
        .map_err(|e| ElabError::operand(e, span))
}

fn elaborate_instance(
    ctx: &mut ElaborationContext<'_>,
    scope: &Scope,
    module: &str,
    suffix: &str,
    config: &[Token],
    args: &[Expr],
    span: Span,
) -> Result<(), ElabError> {
    let registry = ctx.registry;
    let entry = registry
        .lookup(module)
        .ok_or_else(|| ElabError::UnknownModule {
            name: module.to_string(),
            span,
        })?;
    if entry.param_count() != args.len() {
        return Err(ElabError::ArgCount {
            module: module.to_string(),
            expected: entry.param_count(),
            found: args.len(),
            span,
        });
    }

    let child = match entry {
        ModuleEntry::Source(decl) => {
            if let Some(token) = config.first() {
                return Err(ElabError::Config {
                    message: format!("module `{module}` takes no configuration"),
                    span: if token.span.is_dummy() { span } else { token.span },
                });
            }
            if !ctx.push_elab_stack(&decl.name) {
                return Err(ElabError::Circular {
                    module: module.to_string(),
                    span,
                });
            }
            let child = instantiate_source(ctx, decl, suffix, false);
            ctx.pop_elab_stack();
            child
        }
        ModuleEntry::Builtin(builtin) => {
            let width = builtin.configure(&mut TokenStream::new(config), span)?;
            builtin.instantiate(&mut ctx.design, width, suffix, span)?
        }
    };

    for (slot, arg) in args.iter().enumerate() {
        if let Err(err) = bind_slot(ctx, scope, &child, slot, arg) {
            ctx.sink.emit(err.to_diagnostic());
        }
    }
    Ok(())
}

/// Connects one parameter slot of `child` to the parent's argument.
///
/// Input slots bind the child's pin to the argument; output slots add the
/// child's output as a writer of the argument.
fn bind_slot(
    ctx: &mut ElaborationContext<'_>,
    scope: &Scope,
    child: &Instance,
    slot: usize,
    arg: &Expr,
) -> Result<(), ElabError> {
    let param = child.params[slot];
    let span = arg.span();
    if child.is_inst_param_in(&ctx.design, slot) {
        let width = ctx.design.operand(param).width();
        let value = read_expr(ctx, scope, arg, Some(width))?;
        ctx.design
            .bind(param, value)
            .map_err(|e| ElabError::operand(e, span))
    } else {
        let (target, range) = write_expr(ctx, scope, arg)?;
        ctx.design
            .add_writer(target, range, param, span)
            .map_err(|e| ElabError::operand(e, span))
    }
}
