//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::{ProjectConfig, Stimulus};
use std::path::Path;

/// Name of the configuration file inside a project directory.
pub const CONFIG_FILE: &str = "copper.toml";

/// Loads and validates `<project_dir>/copper.toml`.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let content = std::fs::read_to_string(project_dir.join(CONFIG_FILE))?;
    load_config_from_str(&content)
}

/// Parses and validates a configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.project.name.is_empty() {
        return Err(ConfigError::MissingField("project.name".to_string()));
    }
    if config.project.top.is_empty() {
        return Err(ConfigError::MissingField("project.top".to_string()));
    }
    if config.project.design.is_empty() {
        return Err(ConfigError::MissingField("project.design".to_string()));
    }
    if config.sim.max_depth == 0 {
        return Err(ConfigError::ValidationError(
            "sim.max_depth must be positive".to_string(),
        ));
    }
    for (pin, stimulus) in &config.stimulus {
        validate_stimulus(pin, stimulus)?;
    }
    Ok(())
}

fn validate_stimulus(pin: &str, stimulus: &Stimulus) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidStimulus {
        pin: pin.to_string(),
        reason,
    };
    if stimulus.is_empty() {
        return Err(invalid("no values".to_string()));
    }
    if let Stimulus::Pattern(p) = stimulus {
        if let Some(c) = p.chars().find(|c| *c != '0' && *c != '1') {
            return Err(invalid(format!("unexpected character '{c}'")));
        }
    }
    Ok(())
}
