//! Error types for the cache
//!
//! Cache reads and writes never fail; these errors cover construction,
//! configuration loading and worker shutdown.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Background workers need a tokio runtime to be spawned on
    #[error("No tokio runtime available to spawn cache workers")]
    NoRuntime,

    /// A background worker panicked or was cancelled
    #[error("Worker failed: {0}")]
    Worker(String),

    /// A configuration value could not be parsed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<tokio::task::JoinError> for CacheError {
    fn from(err: tokio::task::JoinError) -> Self {
        CacheError::Worker(err.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
