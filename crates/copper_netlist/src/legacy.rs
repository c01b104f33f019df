//! Import of a previously exported netlist.
//!
//! Regenerating a design should not renumber its parts or nets. The old
//! netlist is a tree of parenthesized blocks; each block starts with its
//! type word and is identified by the dotted path of types from the root,
//! e.g. `export.components.comp`. Only two kinds of blocks matter:
//!
//! - `comp` blocks map a component timestamp (`tstamp`) to its reference
//!   designator (`ref`),
//! - `net` blocks map a net `name` to its integer `code`.
//!
//! A double quote toggles a quoted span in which whitespace and parentheses
//! are literal; a backslash makes the next character literal anywhere.

use std::collections::HashMap;
use std::path::Path;

use crate::error::ImportError;

/// Reference designators and net codes from a legacy netlist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyNetlist {
    /// Component timestamp to reference designator.
    pub refs: HashMap<String, String>,
    /// Net name to net code.
    pub codes: HashMap<String, u32>,
}

impl LegacyNetlist {
    /// Reads and parses a legacy netlist file.
    pub fn load(path: &Path) -> Result<Self, ImportError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Parses legacy netlist text.
    pub fn parse(text: &str) -> Result<Self, ImportError> {
        let blocks = Parser::new(text).parse()?;
        let mut legacy = LegacyNetlist::default();
        for block in &blocks {
            legacy.visit(block, "")?;
        }
        log::debug!(
            "legacy netlist: {} references, {} net codes",
            legacy.refs.len(),
            legacy.codes.len()
        );
        Ok(legacy)
    }

    fn visit(&mut self, block: &Block, parent: &str) -> Result<(), ImportError> {
        let path = if parent.is_empty() {
            block.kind.clone()
        } else {
            format!("{parent}.{}", block.kind)
        };
        match path.as_str() {
            "export.components.comp" => {
                if let (Some(r), Some(t)) = (block.field("ref"), block.field("tstamp")) {
                    self.refs.insert(t.to_string(), r.to_string());
                }
            }
            "export.net" | "export.nets.net" => {
                if let (Some(code), Some(name)) = (block.field("code"), block.field("name")) {
                    let code = code.parse().map_err(|_| ImportError::BadCode {
                        net: name.to_string(),
                        value: code.to_string(),
                    })?;
                    self.codes.insert(name.to_string(), code);
                }
            }
            _ => {}
        }
        for child in &block.children {
            self.visit(child, &path)?;
        }
        Ok(())
    }
}

/// One parenthesized block.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Block {
    kind: String,
    atoms: Vec<String>,
    children: Vec<Block>,
}

impl Block {
    /// First atom of the first child block of type `kind`.
    fn field(&self, kind: &str) -> Option<&str> {
        self.children
            .iter()
            .find(|c| c.kind == kind)
            .and_then(|c| c.atoms.first())
            .map(String::as_str)
    }
}

enum Token {
    Open,
    Close(usize),
    Atom(String),
}

struct Parser<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.char_indices().peekable(),
        }
    }

    fn next_token(&mut self) -> Option<Token> {
        while let Some(&(offset, c)) = self.chars.peek() {
            match c {
                c if c.is_whitespace() => {
                    self.chars.next();
                }
                '(' => {
                    self.chars.next();
                    return Some(Token::Open);
                }
                ')' => {
                    self.chars.next();
                    return Some(Token::Close(offset));
                }
                _ => return Some(Token::Atom(self.atom())),
            }
        }
        None
    }

    fn atom(&mut self) -> String {
        let mut text = String::new();
        let mut quoted = false;
        while let Some(&(_, c)) = self.chars.peek() {
            match c {
                '\\' => {
                    self.chars.next();
                    if let Some((_, escaped)) = self.chars.next() {
                        text.push(escaped);
                    }
                }
                '"' => {
                    self.chars.next();
                    quoted = !quoted;
                }
                c if !quoted && (c.is_whitespace() || c == '(' || c == ')') => break,
                c => {
                    self.chars.next();
                    text.push(c);
                }
            }
        }
        text
    }

    fn parse(mut self) -> Result<Vec<Block>, ImportError> {
        let mut roots = Vec::new();
        let mut stack: Vec<Block> = Vec::new();
        while let Some(token) = self.next_token() {
            match token {
                Token::Open => stack.push(Block {
                    kind: String::new(),
                    atoms: Vec::new(),
                    children: Vec::new(),
                }),
                Token::Close(offset) => {
                    let block = stack.pop().ok_or(ImportError::Unbalanced { offset })?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(block),
                        None => roots.push(block),
                    }
                }
                Token::Atom(atom) => {
                    // atoms outside any block are ignored
                    if let Some(block) = stack.last_mut() {
                        if block.kind.is_empty() && block.atoms.is_empty() {
                            block.kind = atom;
                        } else {
                            block.atoms.push(atom);
                        }
                    }
                }
            }
        }
        if !stack.is_empty() {
            let block = stack
                .iter()
                .map(|b| b.kind.as_str())
                .collect::<Vec<_>>()
                .join(".");
            return Err(ImportError::UnexpectedEof { block });
        }
        Ok(roots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn literal_example() {
        let legacy =
            LegacyNetlist::parse("(export (components (comp (ref R1)(tstamp ABC))) (net (code 1)(name GND)))")
                .unwrap();
        assert_eq!(legacy.refs, HashMap::from([("ABC".to_string(), "R1".to_string())]));
        assert_eq!(legacy.codes, HashMap::from([("GND".to_string(), 1)]));
    }

    #[test]
    fn quoting_and_escapes() {
        let legacy = LegacyNetlist::parse(
            r#"(export (nets (net (code 7) (name "a b(c)")) (net (code 8) (name x\"y))))"#,
        )
        .unwrap();
        assert_eq!(legacy.codes.get("a b(c)"), Some(&7));
        assert_eq!(legacy.codes.get("x\"y"), Some(&8));
    }

    #[test]
    fn escaped_quote_inside_quotes() {
        let legacy =
            LegacyNetlist::parse(r#"(export (components (comp (ref "U\"2") (tstamp 0A1B))))"#).unwrap();
        assert_eq!(legacy.refs.get("0A1B").map(String::as_str), Some("U\"2"));
    }

    #[test]
    fn blocks_elsewhere_are_ignored() {
        let legacy = LegacyNetlist::parse(
            "(export (design (comp (ref X1) (tstamp T))) (libparts (net (code 3) (name N))))",
        )
        .unwrap();
        assert!(legacy.refs.is_empty());
        assert!(legacy.codes.is_empty());
    }

    #[test]
    fn eof_inside_block() {
        let err = LegacyNetlist::parse("(export (components (comp (ref R1)").unwrap_err();
        match err {
            ImportError::UnexpectedEof { block } => assert_eq!(block, "export.components.comp"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn unbalanced_close() {
        let err = LegacyNetlist::parse("(export))").unwrap_err();
        assert!(matches!(err, ImportError::Unbalanced { offset: 8 }));
    }

    #[test]
    fn non_integer_code() {
        let err = LegacyNetlist::parse("(export (net (code one) (name GND)))").unwrap_err();
        assert_eq!(err.to_string(), "net code `one` of `GND` is not an integer");
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "(export (net (code 4) (name VCC)))").unwrap();
        let legacy = LegacyNetlist::load(file.path()).unwrap();
        assert_eq!(legacy.codes.get("VCC"), Some(&4));

        let missing = LegacyNetlist::load(Path::new("/nonexistent/old.net"));
        assert!(matches!(missing, Err(ImportError::Io(_))));
    }
}
