//! Error types for softcache operations

use thiserror::Error;

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Error type shared by the facade and backend drivers
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key rejected before any backend interaction
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey {
        /// The offending key
        key: String,
        /// Why it was rejected
        reason: String,
    },

    /// Client construction was given an unusable configuration
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The backend pool could not be established
    #[error("backend initialization failed")]
    Initialization(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    /// Transport or protocol failure reported by the backend
    #[error("backend error: {0}")]
    Backend(String),

    /// The backend did not answer within its configured timeout
    #[error("operation timeout")]
    Timeout,

    /// Conditional write refused because the key already exists
    #[error("key already exists: {0}")]
    KeyExists(String),

    /// Operation requires an existing key
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// Value could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Error while releasing backend connections
    #[error("shutdown error: {0}")]
    Shutdown(String),
}
