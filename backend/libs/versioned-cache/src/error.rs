//! Cache error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Envelope is older than the scope's change counter. Never leaves the
    /// read path; callers treat it as a miss.
    #[error("Stale envelope: stored version {stored} < change counter {current}")]
    Stale { stored: i64, current: i64 },

    #[error("Cache store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid counter value: {0}")]
    InvalidCounter(String),
}

impl CacheError {
    /// Whether this error should be treated as a plain cache miss.
    pub fn is_miss(&self) -> bool {
        matches!(self, CacheError::Stale { .. } | CacheError::Serialization(_))
    }
}

pub type CacheResult<T> = Result<T, CacheError>;
