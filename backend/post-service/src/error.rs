/// Error types for Post Service
///
/// Errors reach callers as GraphQL errors carrying a `code` extension.
use async_graphql::ErrorExtensions;
use std::fmt;

use crate::db::StoreError;

/// Result type for post-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Debug)]
pub enum AppError {
    /// Post absent in the durable store
    NotFound(String),

    /// Durable store connection or query failure
    StoreUnavailable(String),

    /// The mutation was persisted but the cache could not be invalidated
    InvalidationFailed(String),

    /// Read-counter store failure
    CacheError(String),

    /// Validation failed
    ValidationError(String),

    /// Misconfigured service wiring
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            AppError::InvalidationFailed(_) => "INVALIDATION_FAILED",
            AppError::CacheError(_) => "CACHE_UNAVAILABLE",
            AppError::ValidationError(_) => "BAD_USER_INPUT",
            AppError::Internal(_) => "INTERNAL",
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::StoreUnavailable(msg) => write!(f, "Store unavailable: {}", msg),
            AppError::InvalidationFailed(msg) => write!(f, "Cache invalidation failed: {}", msg),
            AppError::CacheError(msg) => write!(f, "Cache error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl ErrorExtensions for AppError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| e.set("code", self.code()))
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => AppError::NotFound(format!("post {}", id)),
            other => AppError::StoreUnavailable(other.to_string()),
        }
    }
}
