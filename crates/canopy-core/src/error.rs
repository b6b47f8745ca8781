//! Error types for canopy-core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A setter, initial state or snapshot had the wrong shape
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Type error: expected {expected}, got {got}")]
    TypeError { expected: String, got: String },
}

impl Error {
    /// Shorthand for a configuration error about an unexpected value shape
    pub(crate) fn expected_map(what: &str, got: &crate::Value) -> Self {
        Error::Configuration(format!(
            "{} must be a map, got {}",
            what,
            got.type_name()
        ))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
