//! Diagnostic codes and errors for elaboration.
//!
//! Codes `E100`--`E113` cover elaboration failures (unknown names, writes to
//! inputs, overlapping writers, bad configuration, ...). `W100` warns about
//! bits of a wire or output that nothing drives.

use copper_diagnostics::{Category, Diagnostic, DiagnosticCode, Label};
use copper_ir::{BitRange, OperandError};
use copper_source::Span;

/// Unknown module referenced by an instance.
pub const E100: DiagnosticCode = DiagnosticCode::new(Category::Error, 100);
/// Module defined twice, or shadowing a built-in.
pub const E101: DiagnosticCode = DiagnosticCode::new(Category::Error, 101);
/// Reference to an unknown name.
pub const E102: DiagnosticCode = DiagnosticCode::new(Category::Error, 102);
/// Name declared twice in one module, or a reserved name.
pub const E103: DiagnosticCode = DiagnosticCode::new(Category::Error, 103);
/// Write to an input pin.
pub const E104: DiagnosticCode = DiagnosticCode::new(Category::Error, 104);
/// Overlapping writers on a non-wired operand.
pub const E105: DiagnosticCode = DiagnosticCode::new(Category::Error, 105);
/// Width mismatch in an assignment or binding.
pub const E106: DiagnosticCode = DiagnosticCode::new(Category::Error, 106);
/// Wrong number of instance arguments.
pub const E107: DiagnosticCode = DiagnosticCode::new(Category::Error, 107);
/// Invalid or out-of-range configuration token.
pub const E108: DiagnosticCode = DiagnosticCode::new(Category::Error, 108);
/// Reversed or out-of-bounds range.
pub const E109: DiagnosticCode = DiagnosticCode::new(Category::Error, 109);
/// Module instantiates itself.
pub const E110: DiagnosticCode = DiagnosticCode::new(Category::Error, 110);
/// Top module not found.
pub const E111: DiagnosticCode = DiagnosticCode::new(Category::Error, 111);
/// Write to something that is not writable.
pub const E112: DiagnosticCode = DiagnosticCode::new(Category::Error, 112);
/// Width above 32 bits.
pub const E113: DiagnosticCode = DiagnosticCode::new(Category::Error, 113);

/// Bits of a wire or output that nothing drives.
pub const W100: DiagnosticCode = DiagnosticCode::new(Category::Warning, 100);

/// A failed assignment, instance or binding.
///
/// The failing item is skipped; the rest of the module keeps elaborating.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ElabError {
    /// No module with this name.
    #[error("unknown module `{name}`")]
    UnknownModule {
        /// Requested module.
        name: String,
        /// Instance span.
        span: Span,
    },

    /// No parameter or wire with this name.
    #[error("unknown name `{name}`")]
    UnknownName {
        /// Requested name.
        name: String,
        /// Expression span.
        span: Span,
    },

    /// Argument count differs from the parameter count.
    #[error("module `{module}` takes {expected} arguments but {found} were given")]
    ArgCount {
        /// Instantiated module.
        module: String,
        /// Parameter count.
        expected: usize,
        /// Argument count.
        found: usize,
        /// Instance span.
        span: Span,
    },

    /// Configuration tokens were rejected.
    #[error("{message}")]
    Config {
        /// What is wrong.
        message: String,
        /// Token span.
        span: Span,
    },

    /// A module instantiates itself, directly or indirectly.
    #[error("circular instantiation of module `{module}`")]
    Circular {
        /// The module.
        module: String,
        /// Instance span.
        span: Span,
    },

    /// An operand rule was violated.
    #[error("{error}")]
    Operand {
        /// The violation.
        error: OperandError,
        /// Expression span.
        span: Span,
    },
}

impl ElabError {
    /// Wraps an operand error with the span of the offending expression.
    pub fn operand(error: OperandError, span: Span) -> Self {
        ElabError::Operand { error, span }
    }

    /// The span the error points at.
    pub fn span(&self) -> Span {
        match self {
            ElabError::UnknownModule { span, .. }
            | ElabError::UnknownName { span, .. }
            | ElabError::ArgCount { span, .. }
            | ElabError::Config { span, .. }
            | ElabError::Circular { span, .. }
            | ElabError::Operand { span, .. } => *span,
        }
    }

    /// The diagnostic code.
    pub fn code(&self) -> DiagnosticCode {
        match self {
            ElabError::UnknownModule { .. } => E100,
            ElabError::UnknownName { .. } => E102,
            ElabError::ArgCount { .. } => E107,
            ElabError::Config { .. } => E108,
            ElabError::Circular { .. } => E110,
            ElabError::Operand { error, .. } => operand_code(error),
        }
    }

    /// Converts to a diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.code(), self.to_string(), self.span());
        match self {
            ElabError::UnknownModule { .. } => {
                diag.with_help("check the module name against the design and the built-in library")
            }
            ElabError::Circular { .. } => {
                diag.with_note("the module directly or indirectly instantiates itself")
            }
            ElabError::Operand {
                error: OperandError::WriteToInput { .. },
                ..
            } => diag.with_note("input pins are driven by the instantiating module"),
            _ => diag,
        }
    }
}

fn operand_code(error: &OperandError) -> DiagnosticCode {
    match error {
        OperandError::WriteToInput { .. } => E104,
        OperandError::NotWritable { .. } => E112,
        OperandError::OverlappingWriters { .. } => E105,
        OperandError::WidthMismatch { .. } => E106,
        OperandError::InvalidSlice { .. } => E109,
        OperandError::TooWide { .. } => E113,
    }
}

/// Creates a diagnostic for a module defined twice.
pub fn error_duplicate_module(name: &str, span: Span, prev_span: Span) -> Diagnostic {
    let diag = Diagnostic::error(E101, format!("duplicate module `{name}`"), span);
    if prev_span.is_dummy() {
        diag.with_note(format!("`{name}` is a built-in module"))
    } else {
        diag.with_label(Label::secondary(prev_span, "previously defined here"))
    }
}

/// Creates a diagnostic for a name declared twice in one module.
pub fn error_duplicate_declaration(name: &str, span: Span, prev_span: Span) -> Diagnostic {
    Diagnostic::error(E103, format!("`{name}` is declared twice"), span)
        .with_label(Label::secondary(prev_span, "first declared here"))
}

/// Creates a diagnostic for a declaration using a supply net name.
pub fn error_reserved_name(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E103, format!("`{name}` is a reserved net name"), span)
}

/// Creates a diagnostic for a missing top module.
pub fn error_top_not_found(name: &str) -> Diagnostic {
    Diagnostic::error(E111, format!("top module `{name}` not found"), Span::DUMMY)
        .with_help("set `project.top` in copper.toml to a module of the design")
}

/// Creates a diagnostic for an invalid declared range.
pub fn error_bad_range(name: &str, hi: i32, lo: i32, span: Span) -> Diagnostic {
    Diagnostic::error(E109, format!("invalid range [{hi}:{lo}] of `{name}`"), span)
}

/// Creates a diagnostic for a declaration wider than 32 bits.
pub fn error_too_wide(name: &str, width: u32, span: Span) -> Diagnostic {
    Diagnostic::error(E113, format!("`{name}` is {width} bits wide; at most 32 are supported"), span)
}

/// Creates a diagnostic for writers that overlap.
pub fn error_overlap(error: &OperandError, span: Span) -> Diagnostic {
    Diagnostic::error(E105, error.to_string(), span)
        .with_help("declare the wire as `wired` to merge open-collector drivers")
}

/// Creates a warning for bits that nothing drives.
pub fn warn_undriven(name: &str, gap: BitRange, span: Span) -> Diagnostic {
    Diagnostic::warning(W100, format!("bits {gap} of `{name}` are never driven"), span)
        .with_note("undriven bits float in simulation")
}
