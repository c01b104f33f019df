//! Resolution of operand expressions against an instance's variables.

use copper_ir::ast::Expr;
use copper_ir::{BitRange, OperandError, OperandId, Scope};

use crate::context::ElaborationContext;
use crate::errors::ElabError;

fn lookup(ctx: &ElaborationContext<'_>, scope: &Scope, name: &str, expr: &Expr) -> Result<OperandId, ElabError> {
    ctx.design
        .interner()
        .get(name)
        .and_then(|ident| scope.lookup(ident))
        .ok_or_else(|| ElabError::UnknownName {
            name: name.to_string(),
            span: expr.span(),
        })
}

/// Resolves an expression that is read.
///
/// An unsized literal takes `expected` as its width when its value fits,
/// so `0` can be connected to a bus.
pub fn read_expr(
    ctx: &mut ElaborationContext<'_>,
    scope: &Scope,
    expr: &Expr,
    expected: Option<u32>,
) -> Result<OperandId, ElabError> {
    match expr {
        Expr::Ref { name, .. } => lookup(ctx, scope, name, expr),
        Expr::Slice { name, hi, lo, span } => {
            let target = lookup(ctx, scope, name, expr)?;
            ctx.design
                .slice(target, *lo, *hi, *span)
                .map_err(|e| ElabError::operand(e, *span))
        }
        Expr::Literal { value, width, span } => {
            let declared = match (width, expected) {
                (Some(w), _) => *w,
                (None, Some(w)) if w <= 32 && (*value >> w) == 0 => w,
                (None, _) => 0,
            };
            ctx.design
                .constant(*value, declared, *span)
                .map_err(|e| ElabError::operand(e, *span))
        }
    }
}

/// Resolves an expression that is written, returning the operand and the
/// absolute range written.
///
/// Writability itself is checked when the writer is added.
pub fn write_expr(
    ctx: &ElaborationContext<'_>,
    scope: &Scope,
    expr: &Expr,
) -> Result<(OperandId, BitRange), ElabError> {
    match expr {
        Expr::Ref { name, .. } => {
            let target = lookup(ctx, scope, name, expr)?;
            Ok((target, ctx.design.operand(target).range))
        }
        Expr::Slice { name, hi, lo, span } => {
            let target = lookup(ctx, scope, name, expr)?;
            let range = ctx
                .design
                .check_range(target, *lo, *hi)
                .map_err(|e| ElabError::operand(e, *span))?;
            Ok((target, range))
        }
        Expr::Literal { value, span, .. } => Err(ElabError::operand(
            OperandError::NotWritable {
                name: value.to_string(),
            },
            *span,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ModuleRegistry;
    use copper_diagnostics::DiagnosticSink;
    use copper_ir::ast::DesignSource;
    use copper_ir::{Operand, OperandKind};
    use copper_source::Span;

    fn with_ctx(f: impl FnOnce(&mut ElaborationContext<'_>, &mut Scope)) {
        let src = DesignSource::default();
        let sink = DiagnosticSink::new();
        let registry = ModuleRegistry::new(&src, &sink);
        let mut ctx = ElaborationContext::new(&registry, &sink);
        let mut scope = Scope::new();
        let name = ctx.design.interner().get_or_intern("bus");
        let bus = ctx.design.add_operand(Operand::new(
            name,
            BitRange::new(0, 7).unwrap(),
            OperandKind::Wire {
                wired: false,
                writers: Vec::new(),
            },
            Span::DUMMY,
        ));
        scope.register(name, bus);
        f(&mut ctx, &mut scope);
    }

    fn lit(value: u64, width: Option<u32>) -> Expr {
        Expr::Literal {
            value,
            width,
            span: Span::DUMMY,
        }
    }

    #[test]
    fn unknown_name() {
        with_ctx(|ctx, scope| {
            let expr = Expr::Ref {
                name: "nope".to_string(),
                span: Span::DUMMY,
            };
            let err = read_expr(ctx, scope, &expr, None).unwrap_err();
            assert!(matches!(err, ElabError::UnknownName { .. }));
        });
    }

    #[test]
    fn literal_takes_context_width_when_it_fits() {
        with_ctx(|ctx, scope| {
            let c = read_expr(ctx, scope, &lit(3, None), Some(8)).unwrap();
            assert_eq!(ctx.design.operand(c).width(), 8);
            let c = read_expr(ctx, scope, &lit(300, None), Some(8)).unwrap();
            assert_eq!(ctx.design.operand(c).width(), 9);
            let c = read_expr(ctx, scope, &lit(3, Some(4)), Some(8)).unwrap();
            assert_eq!(ctx.design.operand(c).width(), 4);
        });
    }

    #[test]
    fn slice_write_range() {
        with_ctx(|ctx, scope| {
            let expr = Expr::Slice {
                name: "bus".to_string(),
                hi: 5,
                lo: 2,
                span: Span::DUMMY,
            };
            let (_, range) = write_expr(ctx, scope, &expr).unwrap();
            assert_eq!(range, BitRange::new(2, 5).unwrap());

            let bad = Expr::Slice {
                name: "bus".to_string(),
                hi: 8,
                lo: 2,
                span: Span::DUMMY,
            };
            let err = write_expr(ctx, scope, &bad).unwrap_err();
            assert_eq!(err.code(), crate::errors::E109);
        });
    }

    #[test]
    fn literals_are_not_writable() {
        with_ctx(|ctx, scope| {
            let err = write_expr(ctx, scope, &lit(1, None)).unwrap_err();
            assert_eq!(err.code(), crate::errors::E112);
        });
    }
}
