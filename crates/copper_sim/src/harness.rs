//! Stimulus schedules and sampled traces.

use std::collections::BTreeMap;
use std::fmt::Write;

use copper_common::Rail;
use copper_ir::{Design, OperandId};

/// Values to force on input pins, by tick.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    events: BTreeMap<u32, Vec<(OperandId, Rail)>>,
}

impl Schedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forces `pin` to `value` at `tick`.
    pub fn add(&mut self, tick: u32, pin: OperandId, value: Rail) {
        self.events.entry(tick).or_default().push((pin, value));
    }

    /// Forces scheduled for `tick`, in insertion order.
    pub fn at(&self, tick: u32) -> &[(OperandId, Rail)] {
        self.events.get(&tick).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of scheduled forces.
    pub fn len(&self) -> usize {
        self.events.values().map(Vec::len).sum()
    }

    /// Returns `true` if nothing is scheduled.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Per-tick values of the watched operands.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    watched: Vec<OperandId>,
    samples: Vec<Vec<Rail>>,
}

impl Trace {
    pub(crate) fn new(watched: &[OperandId]) -> Self {
        Self {
            watched: watched.to_vec(),
            samples: vec![Vec::new(); watched.len()],
        }
    }

    /// Watched operands in sampling order.
    pub fn watched(&self) -> &[OperandId] {
        &self.watched
    }

    /// Number of sampled ticks.
    pub fn ticks(&self) -> usize {
        self.samples.first().map_or(0, Vec::len)
    }

    /// Samples of one watched operand, by tick.
    pub fn values(&self, id: OperandId) -> Option<&[Rail]> {
        let index = self.watched.iter().position(|&w| w == id)?;
        Some(&self.samples[index])
    }

    /// Appends a sample; returns `true` when it differs from the previous one.
    pub(crate) fn push(&mut self, id: OperandId, value: Rail) -> bool {
        let Some(index) = self.watched.iter().position(|&w| w == id) else {
            return false;
        };
        let column = &mut self.samples[index];
        let changed = column.last() != Some(&value);
        column.push(value);
        changed
    }

    /// Renders one line per tick, one column per watched operand.
    pub fn render(&self, design: &Design) -> String {
        let headers: Vec<&str> = self.watched.iter().map(|&id| design.name(id)).collect();
        let widths: Vec<usize> = self
            .watched
            .iter()
            .zip(&headers)
            .map(|(&id, name)| name.len().max(design.operand(id).width() as usize))
            .collect();

        let mut out = String::from("tick");
        for (name, width) in headers.iter().zip(&widths) {
            let _ = write!(out, "  {name:>width$}");
        }
        out.push('\n');
        for tick in 0..self.ticks() {
            let _ = write!(out, "{tick:>4}");
            for ((column, &id), width) in self.samples.iter().zip(&self.watched).zip(&widths) {
                let bits = column[tick].to_bit_string(design.operand(id).width());
                let _ = write!(out, "  {bits:>width$}");
            }
            out.push('\n');
        }
        out
    }
}
