//! Simulation error types.
//!
//! A [`Halt`] aborts the current run but leaves the simulator usable; every
//! other [`SimError`] variant is a misuse of the API or an I/O failure.

use std::fmt;
use std::io;

/// Why a run stopped before reaching its last tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Halt {
    /// The value of an operand at a tick depends on itself.
    CombinationalLoop {
        /// Operand whose evaluation was re-entered.
        operand: String,
        /// Tick being evaluated.
        tick: u32,
    },
    /// Evaluation nested deeper than the configured limit.
    Runaway {
        /// Operand being evaluated when the limit was hit.
        operand: String,
        /// Tick being evaluated.
        tick: u32,
        /// The configured limit.
        limit: usize,
    },
    /// Lanes driven both high and low for too many consecutive ticks.
    DriveConflict {
        /// Operand carrying the conflict.
        operand: String,
        /// Conflicting lanes, bit 0 being the lowest index of the operand.
        lanes: u32,
        /// Tick at which the streak exceeded the limit.
        tick: u32,
        /// Length of the streak.
        streak: u32,
    },
    /// The static dependency graph has a cycle that no register breaks.
    StaticLoop {
        /// Operands on the cycle, sorted by name.
        operands: Vec<String>,
    },
}

impl fmt::Display for Halt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Halt::CombinationalLoop { operand, tick } => {
                write!(f, "combinational loop through `{operand}` at tick {tick}")
            }
            Halt::Runaway {
                operand,
                tick,
                limit,
            } => write!(
                f,
                "evaluation of `{operand}` at tick {tick} nested deeper than {limit} levels"
            ),
            Halt::DriveConflict {
                operand,
                lanes,
                tick,
                streak,
            } => write!(
                f,
                "drive conflict on `{operand}` (lanes {lanes:#x}) for {streak} ticks, ending at tick {tick}"
            ),
            Halt::StaticLoop { operands } => {
                write!(f, "combinational loop through {}", quoted(operands))
            }
        }
    }
}

fn quoted(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("`{n}`"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors that can occur during simulation setup or execution.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// The run was halted.
    #[error("simulation halted: {0}")]
    Halted(Halt),

    /// A name did not resolve to an operand of the design.
    #[error("no operand named `{name}`")]
    UnknownOperand {
        /// The name looked up.
        name: String,
    },

    /// Only unbound top-level input pins can be forced.
    #[error("`{name}` is not a forceable input pin")]
    NotForceable {
        /// Name of the operand.
        name: String,
    },

    /// A bit index outside the operand's width.
    #[error("bit {bit} is outside `{name}` ({width} bits wide)")]
    BitOutOfRange {
        /// Name of the operand.
        name: String,
        /// The offending 0-based bit.
        bit: u32,
        /// Width of the operand.
        width: u32,
    },

    /// The waveform recorder was handed an operand it never registered.
    #[error("operand {0} is not registered with the waveform recorder")]
    UnregisteredSignal(u32),

    /// An I/O error occurred while writing waveform data.
    #[error("waveform I/O error: {0}")]
    WaveformIo(#[from] io::Error),
}

impl From<Halt> for SimError {
    fn from(halt: Halt) -> Self {
        SimError::Halted(halt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_display() {
        let e = SimError::from(Halt::CombinationalLoop {
            operand: "y".into(),
            tick: 3,
        });
        assert_eq!(
            e.to_string(),
            "simulation halted: combinational loop through `y` at tick 3"
        );
    }

    #[test]
    fn runaway_display() {
        let h = Halt::Runaway {
            operand: "q".into(),
            tick: 0,
            limit: 8,
        };
        assert_eq!(
            h.to_string(),
            "evaluation of `q` at tick 0 nested deeper than 8 levels"
        );
    }

    #[test]
    fn conflict_display() {
        let h = Halt::DriveConflict {
            operand: "bus".into(),
            lanes: 0b101,
            tick: 4,
            streak: 2,
        };
        assert_eq!(
            h.to_string(),
            "drive conflict on `bus` (lanes 0x5) for 2 ticks, ending at tick 4"
        );
    }

    #[test]
    fn static_loop_display() {
        let h = Halt::StaticLoop {
            operands: vec!["a".into(), "b".into()],
        };
        assert_eq!(h.to_string(), "combinational loop through `a`, `b`");
    }

    #[test]
    fn misuse_display() {
        let e = SimError::NotForceable { name: "y".into() };
        assert_eq!(e.to_string(), "`y` is not a forceable input pin");
        let e = SimError::BitOutOfRange {
            name: "a".into(),
            bit: 4,
            width: 4,
        };
        assert_eq!(e.to_string(), "bit 4 is outside `a` (4 bits wide)");
    }

    #[test]
    fn waveform_io_display() {
        let e = SimError::WaveformIo(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert!(e.to_string().contains("waveform I/O error"));
    }
}
