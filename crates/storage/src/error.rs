//! Storage error types and result alias.
//!
//! All storage backends map their internal errors to these standardized
//! error types so callers can handle failures uniformly.
//!
//! # Example
//!
//! ```
//! use cakewalk_storage::{StorageError, StorageResult};
//!
//! fn lookup(key: &str) -> StorageResult<Vec<u8>> {
//!     Err(StorageError::NotFound(key.to_string()))
//! }
//! ```

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
///
/// This enum represents the canonical set of errors that any storage backend
/// can produce. Backend implementations should map their internal error types
/// to these variants.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested key was not found in the storage backend.
    #[error("Key not found: {0}")]
    NotFound(String),

    /// A conditional write found the key already present.
    ///
    /// Returned by backends that report [`set_if_absent`](crate::StorageBackend::set_if_absent)
    /// conflicts as errors rather than via the boolean result.
    #[error("Key already exists")]
    Conflict,

    /// Connection or network error.
    ///
    /// Indicates a failure to communicate with the storage backend, such as
    /// a network timeout, DNS failure, or connection refused.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Serialization or deserialization error.
    ///
    /// Data could not be encoded for storage or decoded when retrieved.
    /// This typically indicates corruption or schema drift.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal storage backend error.
    ///
    /// Catch-all for backend-specific errors that don't fit other categories.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Operation timed out.
    #[error("Operation timeout")]
    Timeout,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            StorageError::NotFound("product/1".into()).to_string(),
            "Key not found: product/1"
        );
        assert_eq!(StorageError::Conflict.to_string(), "Key already exists");
        assert_eq!(StorageError::Timeout.to_string(), "Operation timeout");
    }
}
