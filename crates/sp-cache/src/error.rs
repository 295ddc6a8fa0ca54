//! Cache error types.

use thiserror::Error;

/// Cache operation errors.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache refused a new entry because it is at capacity.
    #[error("cache is full ({0} live entries)")]
    CapacityExceeded(usize),
    /// Invalid cache configuration.
    #[error("cache configuration error: {0}")]
    Configuration(String),
    /// Internal cache error.
    #[error("internal cache error: {0}")]
    Internal(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
