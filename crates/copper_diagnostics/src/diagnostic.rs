//! The diagnostic record.

use crate::code::DiagnosticCode;
use crate::label::Label;
use crate::severity::Severity;
use copper_source::Span;
use serde::{Deserialize, Serialize};

/// A structured message about one problem in the design.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level.
    pub severity: Severity,
    /// Stable code.
    pub code: DiagnosticCode,
    /// Main message.
    pub message: String,
    /// Where the problem was detected.
    pub primary_span: Span,
    /// Extra annotated spans.
    pub labels: Vec<Label>,
    /// Footnotes (`= note: ...`).
    pub notes: Vec<String>,
    /// Suggestions (`= help: ...`).
    pub help: Vec<String>,
}

impl Diagnostic {
    fn with_severity(
        severity: Severity,
        code: DiagnosticCode,
        message: impl Into<String>,
        span: Span,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            primary_span: span,
            labels: Vec::new(),
            notes: Vec::new(),
            help: Vec::new(),
        }
    }

    /// Creates an error.
    pub fn error(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self::with_severity(Severity::Error, code, message, span)
    }

    /// Creates a warning.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self::with_severity(Severity::Warning, code, message, span)
    }

    /// Adds a label.
    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    /// Adds a note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Adds a help line.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Category;

    #[test]
    fn error_builder() {
        let code = DiagnosticCode::new(Category::Error, 104);
        let diag = Diagnostic::error(code, "cannot write to an input pin", Span::DUMMY)
            .with_label(Label::secondary(Span::DUMMY, "declared as input here"))
            .with_note("inputs are driven by the instantiating module")
            .with_help("declare the parameter as an output");
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.code.to_string(), "E104");
        assert_eq!(diag.labels.len(), 1);
        assert_eq!(diag.notes.len(), 1);
        assert_eq!(diag.help.len(), 1);
    }

    #[test]
    fn warning_builder() {
        let code = DiagnosticCode::new(Category::Warning, 100);
        let diag = Diagnostic::warning(code, "bits 2..3 of `bus` are never driven", Span::DUMMY);
        assert_eq!(diag.severity, Severity::Warning);
        assert!(diag.labels.is_empty());
    }
}
