//! Error types for configuration loading and validation.

/// Errors that can occur when loading or validating a `copper.toml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A required field is missing or empty.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A stimulus entry is malformed.
    #[error("invalid stimulus for `{pin}`: {reason}")]
    InvalidStimulus {
        /// The pin the stimulus drives.
        pin: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),
}
