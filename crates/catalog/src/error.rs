//! Catalog error types.
//!
//! Every catalog operation returns a typed outcome; each variant maps to
//! one stable wire code (see [`CatalogError::code`]) that callers can rely
//! on as a contract.

use cakewalk_storage::StorageError;
use thiserror::Error;

/// Result type alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Failures a catalog operation can report.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    /// The input failed validation (empty/overlong title, etc.).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Another record already holds this title (case-insensitive).
    #[error("A product with this title already exists: {0}")]
    DuplicateTitle(String),

    /// The generated id collided with an existing record.
    ///
    /// Practically unreachable (time-based id plus random suffix), but the
    /// conditional write reports it rather than clobbering.
    #[error("A product with this id already exists: {0}")]
    DuplicateId(String),

    /// No record exists under the given id.
    #[error("Product not found: {0}")]
    NotFound(String),

    /// The operation requires an id and none was given.
    #[error("Missing product id")]
    MissingId,

    /// The storage backend failed.
    ///
    /// Wraps the original [`StorageError`] to preserve the error source
    /// chain for debugging and structured logging.
    #[error("Database error")]
    Database(#[from] StorageError),
}

impl CatalogError {
    /// Stable wire code for this failure, part of the API contract.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            CatalogError::Validation(_) => "VALIDATION_ERROR",
            CatalogError::DuplicateTitle(_) => "DUPLICATE_TITLE",
            CatalogError::DuplicateId(_) => "DUPLICATE_ID",
            CatalogError::NotFound(_) => "PRODUCT_NOT_FOUND",
            CatalogError::MissingId => "MISSING_ID",
            CatalogError::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Creates a [`CatalogError::Validation`] with the given detail.
    pub fn validation(detail: impl Into<String>) -> Self {
        CatalogError::Validation(detail.into())
    }
}
