//! Error types for generation, placement and legacy import.

use copper_diagnostics::{Category, Diagnostic, DiagnosticCode};
use copper_source::Span;

/// Alias loop through plain wires.
pub const E200: DiagnosticCode = DiagnosticCode::new(Category::Error, 200);
/// Unknown placement keyword.
pub const E300: DiagnosticCode = DiagnosticCode::new(Category::Error, 300);
/// Missing or non-numeric placement argument.
pub const E301: DiagnosticCode = DiagnosticCode::new(Category::Error, 301);
/// Placement directive for a component that does not exist.
pub const E302: DiagnosticCode = DiagnosticCode::new(Category::Error, 302);
/// Legacy netlist ends inside a block.
pub const E400: DiagnosticCode = DiagnosticCode::new(Category::Error, 400);
/// Unbalanced `)` in a legacy netlist.
pub const E401: DiagnosticCode = DiagnosticCode::new(Category::Error, 401);
/// Non-integer net code in a legacy netlist.
pub const E402: DiagnosticCode = DiagnosticCode::new(Category::Error, 402);
/// Legacy netlist could not be read.
pub const E403: DiagnosticCode = DiagnosticCode::new(Category::Error, 403);

/// A failure while turning operands into networks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenError {
    /// A plain wire is driven, through writers, by itself.
    #[error("bit {bit} of `{name}` is driven by itself")]
    AliasLoop {
        /// The operand where the loop was detected.
        name: String,
        /// Absolute bit index.
        bit: i32,
        /// Declaration span of the operand.
        span: Span,
    },
}

impl GenError {
    /// Converts to a diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            GenError::AliasLoop { span, .. } => Diagnostic::error(E200, self.to_string(), *span)
                .with_help("break the loop with a gate or declare the wire `wired`"),
        }
    }
}

/// A rejected manual placement directive.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    /// The directive keyword is not `flip` or `offset`.
    #[error("unknown placement directive `{keyword}` for `{component}`")]
    UnknownDirective {
        /// Target reference or name.
        component: String,
        /// The keyword.
        keyword: String,
    },
    /// An argument is absent or not a number.
    #[error("`{keyword}` for `{component}` needs {expected}")]
    BadArgument {
        /// Target reference or name.
        component: String,
        /// The keyword.
        keyword: String,
        /// What was expected.
        expected: &'static str,
    },
    /// No component has this reference or name.
    #[error("no component `{component}` to place")]
    UnknownComponent {
        /// Target reference or name.
        component: String,
    },
}

impl PlacementError {
    /// Converts to a diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let code = match self {
            PlacementError::UnknownDirective { .. } => E300,
            PlacementError::BadArgument { .. } => E301,
            PlacementError::UnknownComponent { .. } => E302,
        };
        let diag = Diagnostic::error(code, self.to_string(), Span::DUMMY);
        match self {
            PlacementError::UnknownDirective { .. } => {
                diag.with_help("directives are `flip` and `offset <x> <y>`")
            }
            _ => diag,
        }
    }
}

/// A failure reading a legacy netlist.
///
/// Callers may continue without legacy data.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The file could not be read.
    #[error("cannot read legacy netlist: {0}")]
    Io(#[from] std::io::Error),
    /// Input ended inside a block.
    #[error("legacy netlist ends inside `{block}`")]
    UnexpectedEof {
        /// Dotted path of the open block.
        block: String,
    },
    /// A `)` without a matching `(`.
    #[error("unbalanced `)` at byte {offset}")]
    Unbalanced {
        /// Byte offset of the parenthesis.
        offset: usize,
    },
    /// A net code that is not an integer.
    #[error("net code `{value}` of `{net}` is not an integer")]
    BadCode {
        /// The net.
        net: String,
        /// The code text.
        value: String,
    },
}

impl ImportError {
    /// The diagnostic code.
    pub fn code(&self) -> DiagnosticCode {
        match self {
            ImportError::UnexpectedEof { .. } => E400,
            ImportError::Unbalanced { .. } => E401,
            ImportError::BadCode { .. } => E402,
            ImportError::Io(_) => E403,
        }
    }

    /// Converts to a diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.code(), self.to_string(), Span::DUMMY)
    }
}
