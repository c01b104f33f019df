//! Human-readable diagnostic rendering.

use crate::diagnostic::Diagnostic;
use crate::label::LabelStyle;
use crate::severity::Severity;
use copper_source::{SourceDb, Span};

/// Formats diagnostics for some output target.
pub trait DiagnosticRenderer {
    /// Renders one diagnostic.
    fn render(&self, diag: &Diagnostic, source_db: &SourceDb) -> String;
}

/// Renders diagnostics in a rustc-style terminal format.
///
/// ```text
/// error[E104]: cannot write to an input pin `a`
///   --> top.cu:4:5
///    |
///  4 |     a = b;
///    |     ^ written here
///    = note: ...
/// ```
pub struct TerminalRenderer {
    /// Emit ANSI colors.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn header(&self, diag: &Diagnostic) -> String {
        let head = format!("{}[{}]", diag.severity, diag.code);
        if !self.color {
            return format!("{head}: {}\n", diag.message);
        }
        let color = match diag.severity {
            Severity::Error => "31",
            Severity::Warning => "33",
            Severity::Note => "36",
        };
        format!("\x1b[1;{color}m{head}\x1b[0m\x1b[1m: {}\x1b[0m\n", diag.message)
    }

    fn snippet(&self, out: &mut String, span: Span, message: &str, source_db: &SourceDb) {
        let Some(file) = source_db.file(span.file) else {
            return;
        };
        let Some(resolved) = source_db.resolve(span) else {
            return;
        };
        let line_num = resolved.line.to_string();
        let padding = " ".repeat(line_num.len());
        out.push_str(&format!("{padding}--> {resolved}\n"));
        out.push_str(&format!("{padding} |\n"));
        let text = file.line_text(span.start);
        out.push_str(&format!("{line_num} | {text}\n"));

        let line_rest = text.len().saturating_sub(resolved.col as usize - 1).max(1);
        let len = (span.end.saturating_sub(span.start) as usize).clamp(1, line_rest);
        let indent = " ".repeat(resolved.col as usize - 1);
        let carets = "^".repeat(len);
        let message = if message.is_empty() {
            String::new()
        } else {
            format!(" {message}")
        };
        out.push_str(&format!("{padding} | {indent}{carets}{message}\n"));
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic, source_db: &SourceDb) -> String {
        let mut out = self.header(diag);

        if !diag.primary_span.is_dummy() {
            let primary = diag
                .labels
                .iter()
                .find(|l| l.style == LabelStyle::Primary)
                .map(|l| l.message.as_str())
                .unwrap_or("");
            self.snippet(&mut out, diag.primary_span, primary, source_db);
        }
        for label in diag
            .labels
            .iter()
            .filter(|l| l.style == LabelStyle::Secondary && !l.span.is_dummy())
        {
            self.snippet(&mut out, label.span, &label.message, source_db);
        }

        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }
        for help in &diag.help {
            out.push_str(&format!("   = help: {help}\n"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{Category, DiagnosticCode};
    use crate::label::Label;

    #[test]
    fn render_error_with_span() {
        let mut db = SourceDb::new();
        let file = db.add_source("top.cu", "module top(in a) {\n    a = b;\n}\n".to_string());
        let span = Span::new(file, 23, 24);
        let diag = Diagnostic::error(
            DiagnosticCode::new(Category::Error, 104),
            "cannot write to an input pin `a`",
            span,
        )
        .with_label(Label::primary(span, "written here"));

        let out = TerminalRenderer::new(false).render(&diag, &db);
        assert!(out.starts_with("error[E104]: cannot write to an input pin `a`\n"));
        assert!(out.contains("--> top.cu:2:5"));
        assert!(out.contains("2 |     a = b;"));
        assert!(out.contains("  |     ^ written here"));
    }

    #[test]
    fn render_secondary_label() {
        let mut db = SourceDb::new();
        let file = db.add_source("top.cu", "wire x;\nwire x;\n".to_string());
        let diag = Diagnostic::error(
            DiagnosticCode::new(Category::Error, 103),
            "`x` is declared twice",
            Span::new(file, 13, 14),
        )
        .with_label(Label::secondary(Span::new(file, 5, 6), "first declared here"));

        let out = TerminalRenderer::new(false).render(&diag, &db);
        assert!(out.contains("--> top.cu:2:6"));
        assert!(out.contains("--> top.cu:1:6"));
        assert!(out.contains("^ first declared here"));
    }

    #[test]
    fn render_without_span() {
        let db = SourceDb::new();
        let diag = Diagnostic::warning(
            DiagnosticCode::new(Category::Warning, 100),
            "bit 3 of `bus` is never driven",
            Span::DUMMY,
        )
        .with_note("undriven bits float")
        .with_help("add a pullup");

        let out = TerminalRenderer::new(false).render(&diag, &db);
        assert!(out.starts_with("warning[W100]"));
        assert!(!out.contains("-->"));
        assert!(out.contains("= note: undriven bits float"));
        assert!(out.contains("= help: add a pullup"));
    }

    #[test]
    fn color_wraps_header() {
        let db = SourceDb::new();
        let diag = Diagnostic::error(DiagnosticCode::new(Category::Error, 100), "x", Span::DUMMY);
        let out = TerminalRenderer::new(true).render(&diag, &db);
        assert!(out.starts_with("\x1b[1;31merror[E100]"));
    }
}
