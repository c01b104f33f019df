//! The built-in module library.
//!
//! Built-in modules synthesize physical parts instead of instantiating a
//! source body. Each kind implements [`BuiltinModule`] and is registered by
//! name, so the library can grow without touching the instantiation code.

mod gate;
mod pull;
mod reg;

pub use gate::Gate;
pub use pull::PullResistor;
pub use reg::Register;

use crate::errors::ElabError;
use copper_common::MAX_WIDTH;
use copper_ir::{
    BitRange, Design, GateFunc, Instance, Operand, OperandId, OperandKind, Scope, TokenStream,
};
use copper_source::Span;

/// A module whose instances are realized by generated parts.
pub trait BuiltinModule: Send + Sync {
    /// Name used by instance items.
    fn name(&self) -> &'static str;

    /// Local parameter names in slot order.
    fn params(&self) -> &'static [&'static str];

    /// Reads the configuration tokens and returns the bus width.
    ///
    /// The default accepts one optional integer width in `1..=32`.
    fn configure(&self, tokens: &mut TokenStream<'_>, span: Span) -> Result<u32, ElabError> {
        parse_width(self.name(), tokens, span)
    }

    /// Creates the parameter operands, internal operands and parts of one
    /// instance.
    fn instantiate(
        &self,
        design: &mut Design,
        width: u32,
        suffix: &str,
        span: Span,
    ) -> Result<Instance, ElabError>;
}

/// Reads an optional width token; absent means 1.
///
/// Any token left over after the width is rejected.
pub fn parse_width(
    module: &str,
    tokens: &mut TokenStream<'_>,
    span: Span,
) -> Result<u32, ElabError> {
    let width = match tokens.eat_int() {
        Some((value, token_span)) => {
            if !(1..=MAX_WIDTH as i64).contains(&value) {
                return Err(ElabError::Config {
                    message: format!("width {value} of `{module}` is outside 1..=32"),
                    span: token_span,
                });
            }
            value as u32
        }
        None => 1,
    };
    if let Some(extra) = tokens.next_token() {
        let span = if extra.span.is_dummy() { span } else { extra.span };
        return Err(ElabError::Config {
            message: format!("unexpected configuration `{}` for `{module}`", extra.kind),
            span,
        });
    }
    Ok(width)
}

/// Every built-in module.
pub fn standard_library() -> Vec<Box<dyn BuiltinModule>> {
    let mut lib: Vec<Box<dyn BuiltinModule>> = vec![
        Box::new(Gate::new("and", GateFunc::And, false)),
        Box::new(Gate::new("or", GateFunc::Or, false)),
        Box::new(Gate::new("nand", GateFunc::Nand, false)),
        Box::new(Gate::new("nor", GateFunc::Nor, false)),
        Box::new(Gate::new("xor", GateFunc::Xor, false)),
        Box::new(Gate::new("not", GateFunc::Not, false)),
        Box::new(Gate::new("buf", GateFunc::Buf, false)),
        Box::new(Gate::new("oc_not", GateFunc::Not, true)),
        Box::new(Gate::new("oc_buf", GateFunc::Buf, true)),
    ];
    lib.push(Box::new(Register));
    lib.push(Box::new(PullResistor::new(true)));
    lib.push(Box::new(PullResistor::new(false)));
    lib
}

/// Builds the parameter operands of a built-in instance.
struct Params<'d> {
    design: &'d mut Design,
    suffix: &'d str,
    span: Span,
    ids: Vec<OperandId>,
    scope: Scope,
}

impl<'d> Params<'d> {
    fn new(design: &'d mut Design, suffix: &'d str, span: Span) -> Self {
        Self {
            design,
            suffix,
            span,
            ids: Vec::new(),
            scope: Scope::new(),
        }
    }

    fn add(&mut self, local: &str, width: u32, kind: OperandKind) -> OperandId {
        let name = self.design.interner().suffixed(local, self.suffix);
        let id = self.design.add_operand(Operand::new(
            name,
            BitRange::of_width(width),
            kind,
            self.span,
        ));
        let local = self.design.interner().get_or_intern(local);
        self.scope.register(local, id);
        self.ids.push(id);
        id
    }

    fn input(&mut self, local: &str, width: u32) -> OperandId {
        self.add(
            local,
            width,
            OperandKind::InPin {
                binding: None,
                forceable: false,
            },
        )
    }

    fn output(&mut self, local: &str, width: u32) -> OperandId {
        self.add(
            local,
            width,
            OperandKind::OutPin {
                writers: Vec::new(),
            },
        )
    }

    fn finish(self, module: &str) -> Instance {
        Instance {
            module: module.to_string(),
            suffix: self.suffix.to_string(),
            params: self.ids,
            scope: self.scope,
        }
    }
}
