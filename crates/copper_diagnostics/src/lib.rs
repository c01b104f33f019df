//! Structured diagnostics for source, generation and placement problems.
//!
//! Every user-attributable failure in copper becomes a [`Diagnostic`] with a
//! stable [`DiagnosticCode`], a primary [`Span`](copper_source::Span) and
//! optional labels and notes. The thread-safe [`DiagnosticSink`] collects
//! them and [`TerminalRenderer`] prints them rustc-style.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod label;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use label::{Label, LabelStyle};
pub use renderer::{DiagnosticRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
