//! Source locations for diagnostics.
//!
//! The parser that produces copper's module AST records byte spans into the
//! original design files. This crate holds those [`Span`]s and the
//! [`SourceDb`] that turns them back into `file:line:col` for rendering.

#![warn(missing_docs)]

pub mod source_db;
pub mod span;

pub use source_db::{ResolvedSpan, SourceDb, SourceFile};
pub use span::{FileId, Span};
