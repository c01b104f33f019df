//! Tick-based two-rail simulator for copper designs.
//!
//! The simulator evaluates the operand graph of an elaborated
//! [`Design`](copper_ir::Design) directly; it does not need a generated
//! netlist. Time advances in discrete ticks and every value is a
//! [`Rail`](copper_common::Rail): one plane of lanes asserted high, one of
//! lanes asserted low. A lane in neither plane floats; a lane in both is a
//! drive conflict.
//!
//! # Modules
//!
//! - `engine`: memoized evaluation, forcing and halts
//! - `depgraph`: static combinational-loop check
//! - `explain`: provenance trees for single bits
//! - `harness`: stimulus schedules and sampled traces
//! - `waveform`: VCD output
//!
//! # Usage
//!
//! ```ignore
//! let mut sim = Simulator::new(&design, SimOptions::default());
//! let clk = sim.resolve("clk")?;
//! let mut schedule = Schedule::new();
//! for tick in 0..8 {
//!     schedule.add(tick, clk, Rail::from_value(tick % 2, 1));
//! }
//! let trace = sim.run(8, &schedule, &[sim.resolve("q")?])?;
//! print!("{}", trace.render(&design));
//! ```

#![warn(missing_docs)]

pub mod depgraph;
pub mod engine;
pub mod error;
pub mod explain;
pub mod harness;
pub mod waveform;

pub use engine::Simulator;
pub use error::{Halt, SimError};
pub use explain::{Origin, Provenance};
pub use harness::{Schedule, Trace};
pub use waveform::{VcdRecorder, WaveformRecorder};

/// Limits of a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimOptions {
    /// Deepest nesting of evaluations before the run halts.
    pub max_depth: usize,
    /// Consecutive ticks a drive conflict may last before the run halts.
    pub conflict_ticks: u32,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            max_depth: 10_000,
            conflict_ticks: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let options = SimOptions::default();
        assert_eq!(options.max_depth, 10_000);
        assert_eq!(options.conflict_ticks, 0);
    }
}
