//! Error types for the cache layer
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache stores and their construction.
///
/// Absent or expired keys are never errors; they surface as `None`.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Bounded store created with a capacity of zero
    #[error("Invalid capacity: {0} (must be greater than zero)")]
    InvalidCapacity(usize),

    /// Configuration value that cannot be used
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Remote store unreachable or the connection failed mid-request
    #[error("Connection error: {0}")]
    Connection(String),

    /// Remote store did not answer within the configured timeout
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Key or entry could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CacheError {
    /// Returns true for failures of the remote transport (connection or timeout).
    pub fn is_transport(&self) -> bool {
        matches!(self, CacheError::Connection(_) | CacheError::Timeout(_))
    }
}

// == Conversions ==
impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_timeout() {
            CacheError::Timeout(err.to_string())
        } else {
            CacheError::Connection(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache layer.
pub type Result<T> = std::result::Result<T, CacheError>;
