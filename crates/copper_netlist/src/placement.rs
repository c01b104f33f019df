//! Automatic row placement and manual placement directives.
//!
//! Positions are stored in grid steps, [`GRID`] per native unit. Automatic
//! placement puts the connector at the origin and the components in rows to
//! its right. Directives then adjust individual placeables:
//!
//! - `flip` toggles the orientation,
//! - `offset <x> <y>` moves by `(x, y)` native units, rounded to the
//!   nearest twentieth.
//!
//! Several directives for one placeable are separated by `;`.

use std::collections::BTreeMap;

use copper_diagnostics::DiagnosticSink;
use copper_ir::{
    lex_words, Arena, Component, ComponentId, Connector, Placeable, Token, TokenKind, TokenStream,
    GRID,
};

use crate::error::PlacementError;

/// Width of a row before wrapping, in grid steps.
const ROW_WIDTH: i32 = 40 * GRID;

/// Places the connector at the origin and the components in rows.
pub fn auto_place(components: &mut Arena<ComponentId, Component>, connector: &mut Connector) {
    connector.set_position(0, 0);
    let left = connector.size().0 + 2 * GRID;
    let (mut x, mut y, mut row_height) = (left, 0, 0);
    let ids: Vec<_> = components.ids().collect();
    for id in ids {
        let component = &mut components[id];
        let (w, h) = component.size();
        if x > left && x + w > ROW_WIDTH {
            x = left;
            y += row_height + GRID;
            row_height = 0;
        }
        component.set_position(x, y);
        x += w + GRID;
        row_height = row_height.max(h);
    }
}

/// One parsed directive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Directive {
    /// Toggle orientation.
    Flip,
    /// Move by grid steps.
    Offset(i32, i32),
}

/// Converts native units to grid steps, rounding to the nearest step.
fn to_grid(value: f64) -> i32 {
    (value * GRID as f64).round() as i32
}

/// Parses the directive text of one placeable.
pub fn parse_directives(component: &str, text: &str) -> Result<Vec<Directive>, PlacementError> {
    let mut directives = Vec::new();
    for command in text.split(';') {
        let tokens = lex_words(command);
        let mut stream = TokenStream::new(&tokens);
        let Some(keyword) = stream.next_token() else {
            continue;
        };
        let directive = match &keyword.kind {
            TokenKind::Ident(word) if word == "flip" => Directive::Flip,
            TokenKind::Ident(word) if word == "offset" => {
                let mut coord = || stream.next_token().and_then(Token::as_number);
                match (coord(), coord()) {
                    (Some(x), Some(y)) => Directive::Offset(to_grid(x), to_grid(y)),
                    _ => {
                        return Err(PlacementError::BadArgument {
                            component: component.to_string(),
                            keyword: word.clone(),
                            expected: "two numbers",
                        })
                    }
                }
            }
            other => {
                return Err(PlacementError::UnknownDirective {
                    component: component.to_string(),
                    keyword: other.to_string(),
                })
            }
        };
        directives.push(directive);
    }
    Ok(directives)
}

fn apply(target: &mut dyn Placeable, directives: &[Directive]) {
    for directive in directives {
        match *directive {
            Directive::Flip => target.flip(),
            Directive::Offset(dx, dy) => target.offset(dx, dy),
        }
    }
}

/// Applies the configured directives, keyed by reference designator or by
/// component name.
///
/// Rejected directives are reported to `sink`; the rest still apply.
pub fn apply_directives(
    components: &mut Arena<ComponentId, Component>,
    connector: &mut Connector,
    placement: &BTreeMap<String, String>,
    sink: &DiagnosticSink,
) {
    for (key, text) in placement {
        let directives = match parse_directives(key, text) {
            Ok(d) => d,
            Err(err) => {
                sink.emit(err.to_diagnostic());
                continue;
            }
        };
        if *key == connector.reference {
            apply(connector, &directives);
            continue;
        }
        let found = components
            .ids()
            .find(|&id| components[id].reference == *key || components[id].name == *key);
        match found {
            Some(id) => apply(&mut components[id], &directives),
            None => sink.emit(
                PlacementError::UnknownComponent {
                    component: key.clone(),
                }
                .to_diagnostic(),
            ),
        }
    }
}
