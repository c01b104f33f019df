//! Shared foundational types used across the copper netlist compiler.
//!
//! This crate provides interned identifiers, stable part timestamps, the
//! per-lane [`Logic`] state and the packed two-rail [`Rail`] signal value
//! used by the simulator.

#![warn(missing_docs)]

pub mod ident;
pub mod logic;
pub mod rail;
pub mod stamp;

pub use ident::{Ident, Interner};
pub use logic::Logic;
pub use rail::{lane_mask, Rail, MAX_WIDTH};
pub use stamp::Timestamp;
