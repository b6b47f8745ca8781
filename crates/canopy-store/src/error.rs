//! Error types for canopy-store

use thiserror::Error;

/// Result type for canopy-store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or configuring a store
///
/// Every variant is a configuration error: it is raised at the offending
/// call, before any snapshot is published.
#[derive(Debug, Error)]
pub enum Error {
    /// A parent store was given without the key to nest under
    #[error("a feature key is required when a parent store is present")]
    MissingFeature,

    /// The feature key cannot be used as a field name
    #[error("invalid feature key {0:?}")]
    InvalidFeature(String),

    /// Store configuration could not be parsed
    #[error("RON parse error: {0}")]
    Config(#[from] ron::error::SpannedError),

    /// Core error
    #[error("core error: {0}")]
    Core(#[from] canopy_core::Error),
}

impl Error {
    /// Whether this error comes from a malformed setup rather than runtime state
    pub fn is_configuration(&self) -> bool {
        match self {
            Error::MissingFeature | Error::InvalidFeature(_) | Error::Config(_) => true,
            Error::Core(canopy_core::Error::Configuration(_)) => true,
            Error::Core(_) => false,
        }
    }
}
