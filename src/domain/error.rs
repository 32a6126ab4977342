//! Domain error types

use thiserror::Error;

/// Error when parsing an interval string
#[derive(Debug, Clone, Error)]
#[error("Invalid interval format: \"{input}\". Expected format: <number>ms, <number>s, <number>m, or <number>m<number>s (e.g., 500ms, 2s, 1m30s)")]
pub struct IntervalParseError {
    pub input: String,
}

/// Error when an unknown capture kind is requested
#[derive(Debug, Clone, Error)]
#[error("Invalid capture kind: \"{input}\". Valid kinds are: types, text, html, file")]
pub struct InvalidCaptureKindError {
    pub input: String,
}

/// Error when an unknown paste modifier is configured
#[derive(Debug, Clone, Error)]
#[error("Invalid paste modifier: \"{input}\". Valid modifiers are: control, meta")]
pub struct InvalidModifierError {
    pub input: String,
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}
