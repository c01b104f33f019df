//! Loaded source text and span resolution.

use crate::span::{FileId, Span};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// A design file with precomputed line starts.
#[derive(Debug)]
pub struct SourceFile {
    /// Path shown in diagnostics.
    pub path: PathBuf,
    /// Full text. Empty when the file could not be read.
    pub content: String,
    line_starts: Vec<u32>,
}

impl SourceFile {
    fn new(path: PathBuf, content: String) -> Self {
        let mut line_starts = vec![0u32];
        line_starts.extend(
            content
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| (i + 1) as u32),
        );
        Self {
            path,
            content,
            line_starts,
        }
    }

    /// Converts a byte offset into 1-based `(line, column)`.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        (line_idx as u32 + 1, offset - self.line_starts[line_idx] + 1)
    }

    /// Returns the full text of the line containing `offset`, without newline.
    pub fn line_text(&self, offset: u32) -> &str {
        let (line, _) = self.line_col(offset);
        let start = self.line_starts[line as usize - 1] as usize;
        let end = self
            .line_starts
            .get(line as usize)
            .map(|s| *s as usize - 1)
            .unwrap_or(self.content.len());
        self.content.get(start..end).unwrap_or("")
    }
}

/// A span resolved to line/column coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSpan {
    /// File path.
    pub path: PathBuf,
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub col: u32,
}

impl fmt::Display for ResolvedSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.path.display(), self.line, self.col)
    }
}

/// All design files of a session, indexed by [`FileId`].
///
/// File ids are assigned in insertion order, matching the `files` list of the
/// design source document.
#[derive(Debug, Default)]
pub struct SourceDb {
    files: Vec<SourceFile>,
}

impl SourceDb {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a file from disk.
    pub fn load_file(&mut self, path: &Path) -> Result<FileId, io::Error> {
        let content = std::fs::read_to_string(path)?;
        Ok(self.add_source(path, content))
    }

    /// Registers a file whose text is unavailable so ids stay aligned.
    pub fn add_missing(&mut self, path: impl Into<PathBuf>) -> FileId {
        self.add_source(path, String::new())
    }

    /// Adds in-memory text.
    pub fn add_source(&mut self, path: impl Into<PathBuf>, content: String) -> FileId {
        let id = FileId::from_raw(self.files.len() as u32);
        self.files.push(SourceFile::new(path.into(), content));
        id
    }

    /// Returns the file for an id, if any.
    pub fn file(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.as_raw() as usize)
    }

    /// Resolves a span to its start coordinates.
    ///
    /// Returns `None` for dummy spans and unknown files.
    pub fn resolve(&self, span: Span) -> Option<ResolvedSpan> {
        if span.is_dummy() {
            return None;
        }
        let file = self.file(span.file)?;
        let (line, col) = file.line_col(span.start);
        Some(ResolvedSpan {
            path: file.path.clone(),
            line,
            col,
        })
    }
}
