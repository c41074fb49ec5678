//! Domain error model.

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// quantity invariants). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A requested quantity delta was non-positive.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    /// A new-batch receipt was missing expiry or pricing details.
    #[error("missing batch details: {0}")]
    MissingBatchDetails(String),

    /// A decrease exceeded the batch's current quantity.
    ///
    /// Carries the quantity actually available so callers can clamp or
    /// re-prompt instead of guessing.
    #[error("insufficient quantity (available: {available})")]
    InsufficientQuantity { available: Decimal },

    /// A value failed validation (e.g. malformed configuration).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A referenced record was not found (domain-level).
    #[error("not found")]
    NotFound,
}

impl DomainError {
    pub fn invalid_quantity(msg: impl Into<String>) -> Self {
        Self::InvalidQuantity(msg.into())
    }

    pub fn missing_batch_details(msg: impl Into<String>) -> Self {
        Self::MissingBatchDetails(msg.into())
    }

    pub fn insufficient(available: Decimal) -> Self {
        Self::InsufficientQuantity { available }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}
