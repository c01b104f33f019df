//! The design source document produced by the external parser.
//!
//! A design source is a JSON document listing the parsed files and the
//! module declarations found in them. Spans index into `files` in order.

use crate::token::Token;
use copper_source::Span;
use serde::{Deserialize, Serialize};

/// Parser output for a whole design.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DesignSource {
    /// Parsed files; a span's file id indexes this list.
    #[serde(default)]
    pub files: Vec<String>,
    /// Module declarations in source order.
    pub modules: Vec<ModuleDecl>,
}

impl DesignSource {
    /// Parses a design source document.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// A source-defined module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDecl {
    /// Module name.
    pub name: String,
    /// Ordered parameters.
    #[serde(default)]
    pub params: Vec<ParamDecl>,
    /// Body items in source order.
    #[serde(default)]
    pub items: Vec<Item>,
    /// Declaration span.
    #[serde(default)]
    pub span: Span,
}

/// Parameter direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Read by the module.
    In,
    /// Driven by the module.
    Out,
}

/// Declared `[hi:lo]` range. Absent means a single bit `[0:0]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeDecl {
    /// High index.
    pub hi: i32,
    /// Low index.
    pub lo: i32,
}

/// One module parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamDecl {
    /// Parameter name.
    pub name: String,
    /// Direction.
    pub direction: Direction,
    /// Bit range.
    #[serde(default)]
    pub range: Option<RangeDecl>,
    /// Whether the simulation harness may force this input when the module
    /// is the top.
    #[serde(default = "forceable_default")]
    pub forceable: bool,
    /// Declaration span.
    #[serde(default)]
    pub span: Span,
}

fn forceable_default() -> bool {
    true
}

/// A module body item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Item {
    /// `wire name[hi:lo];` or `wired name[hi:lo];`
    Wire {
        /// Wire name.
        name: String,
        /// Bit range.
        #[serde(default)]
        range: Option<RangeDecl>,
        /// Open-collector bus.
        #[serde(default)]
        wired: bool,
        /// Declaration span.
        #[serde(default)]
        span: Span,
    },
    /// `target = value;`
    Assign {
        /// Written expression.
        target: Expr,
        /// Read expression.
        value: Expr,
        /// Statement span.
        #[serde(default)]
        span: Span,
    },
    /// `module config... name(args...);`
    Instance {
        /// Instantiated module.
        module: String,
        /// Instance name.
        name: String,
        /// Configuration tokens between module name and instance name.
        #[serde(default)]
        config: Vec<Token>,
        /// Arguments in parameter order.
        #[serde(default)]
        args: Vec<Expr>,
        /// Statement span.
        #[serde(default)]
        span: Span,
    },
}

/// An operand expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expr {
    /// A parameter or wire.
    Ref {
        /// Referenced name.
        name: String,
        /// Expression span.
        #[serde(default)]
        span: Span,
    },
    /// `name[hi:lo]` or `name[i]`.
    Slice {
        /// Sliced name.
        name: String,
        /// High index.
        hi: i32,
        /// Low index.
        lo: i32,
        /// Expression span.
        #[serde(default)]
        span: Span,
    },
    /// Numeric literal with an optional declared width.
    Literal {
        /// Unsigned value.
        value: u64,
        /// Declared width; inferred when absent.
        #[serde(default)]
        width: Option<u32>,
        /// Expression span.
        #[serde(default)]
        span: Span,
    },
}

impl Expr {
    /// The expression's span.
    pub fn span(&self) -> Span {
        match self {
            Expr::Ref { span, .. } | Expr::Slice { span, .. } | Expr::Literal { span, .. } => *span,
        }
    }
}
