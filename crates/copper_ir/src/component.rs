//! Placed components and the top-level connector.

use crate::ids::PartId;
use copper_common::Timestamp;

/// Grid steps per native unit. Positions are stored in twentieths.
pub const GRID: i32 = 20;

/// Anything that can be positioned on the board.
pub trait Placeable {
    /// Reference designator.
    fn reference(&self) -> &str;
    /// Footprint size `(width, height)` in grid steps.
    fn size(&self) -> (i32, i32);
    /// Position `(x, y)` in grid steps.
    fn position(&self) -> (i32, i32);
    /// Moves to `(x, y)` in grid steps.
    fn set_position(&mut self, x: i32, y: i32);
    /// Returns `true` when mirrored.
    fn is_flipped(&self) -> bool;
    /// Toggles mirroring.
    fn flip(&mut self);

    /// Moves by `(dx, dy)` grid steps.
    fn offset(&mut self, dx: i32, dy: i32) {
        let (x, y) = self.position();
        self.set_position(x + dx, y + dy);
    }
}

/// A physical part instance created during generation.
#[derive(Debug, Clone)]
pub struct Component {
    /// Unique hierarchical name.
    pub name: String,
    /// The part it realizes.
    pub part: PartId,
    /// Reference designator prefix.
    pub prefix: &'static str,
    /// Reference designator; empty until assigned.
    pub reference: String,
    /// Value printed in listings.
    pub value: String,
    /// Stable hash of `name`.
    pub timestamp: Timestamp,
    /// Number of pins.
    pub pin_count: u16,
    /// Position in grid steps.
    pub position: (i32, i32),
    /// Mirrored.
    pub flipped: bool,
}

impl Component {
    /// Creates an unplaced component.
    pub fn new(
        name: String,
        part: PartId,
        prefix: &'static str,
        value: String,
        pin_count: u16,
    ) -> Self {
        let timestamp = Timestamp::of_name(&name);
        Self {
            name,
            part,
            prefix,
            reference: String::new(),
            value,
            timestamp,
            pin_count,
            position: (0, 0),
            flipped: false,
        }
    }
}

impl Placeable for Component {
    fn reference(&self) -> &str {
        &self.reference
    }

    fn size(&self) -> (i32, i32) {
        (2 * GRID, GRID * ((self.pin_count as i32 + 1) / 2).max(1))
    }

    fn position(&self) -> (i32, i32) {
        self.position
    }

    fn set_position(&mut self, x: i32, y: i32) {
        self.position = (x, y);
    }

    fn is_flipped(&self) -> bool {
        self.flipped
    }

    fn flip(&mut self) {
        self.flipped = !self.flipped;
    }
}

/// The connector carrying the top module's ports, one pin per port bit.
#[derive(Debug, Clone)]
pub struct Connector {
    /// Reference designator.
    pub reference: String,
    /// Net name of each pin, pin 1 first.
    pub pins: Vec<String>,
    /// Position in grid steps.
    pub position: (i32, i32),
    /// Mirrored.
    pub flipped: bool,
}

impl Connector {
    /// Creates an empty connector.
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            pins: Vec::new(),
            position: (0, 0),
            flipped: false,
        }
    }

    /// Adds a pin and returns its number.
    pub fn add_pin(&mut self, net: impl Into<String>) -> u16 {
        self.pins.push(net.into());
        self.pins.len() as u16
    }
}

impl Placeable for Connector {
    fn reference(&self) -> &str {
        &self.reference
    }

    fn size(&self) -> (i32, i32) {
        (GRID, GRID * (self.pins.len() as i32).max(1))
    }

    fn position(&self) -> (i32, i32) {
        self.position
    }

    fn set_position(&mut self, x: i32, y: i32) {
        self.position = (x, y);
    }

    fn is_flipped(&self) -> bool {
        self.flipped
    }

    fn flip(&mut self) {
        self.flipped = !self.flipped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_follows_name() {
        let a = Component::new("gate/u1".into(), PartId::from_raw(0), "U", "and".into(), 5);
        let b = Component::new("gate/u1".into(), PartId::from_raw(3), "U", "or".into(), 5);
        assert_eq!(a.timestamp, b.timestamp);
        assert!(a.reference.is_empty());
    }

    #[test]
    fn placeable_offset_and_flip() {
        let mut c = Component::new("r".into(), PartId::from_raw(0), "R", "10k".into(), 2);
        c.set_position(20, 40);
        c.offset(-30, 5);
        assert_eq!(c.position(), (-10, 45));
        c.flip();
        assert!(c.is_flipped());
        c.flip();
        assert!(!c.is_flipped());
        assert_eq!(c.size(), (40, 20));
    }

    #[test]
    fn connector_pins_number_from_one() {
        let mut j = Connector::new("J1");
        assert_eq!(j.add_pin("a"), 1);
        assert_eq!(j.add_pin("y[0]"), 2);
        assert_eq!(j.size(), (20, 40));
        assert_eq!(j.reference(), "J1");
    }
}
