//! Parsing and validation of `copper.toml` project configuration files.
//!
//! The configuration names the design document and its top module, the
//! netlist outputs (legacy import file, output path, manual placement
//! directives) and the simulation settings and stimulus.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE};
pub use types::*;
