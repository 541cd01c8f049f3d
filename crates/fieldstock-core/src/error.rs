//! # Error Types
//!
//! Domain-specific error types for fieldstock-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  fieldstock-core errors (this file)                                     │
//! │  ├── CoreError        - Ledger and workflow rule violations             │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  fieldstock-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures                     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (store, item, quantities)
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent ledger rule violations or workflow failures.
/// They abort the enclosing document operation as a whole.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An outbound movement would drive a stock balance negative.
    ///
    /// Raised by the movement gateway before any quantity is written;
    /// the enclosing document operation must fail with it, never
    /// partially apply.
    #[error("Insufficient stock in store {store_id} for item {item_id}: available {available}, requested {requested}")]
    InsufficientStock {
        store_id: String,
        item_id: String,
        available: i64,
        requested: i64,
    },

    /// A workflow document is not in a state that allows the operation.
    ///
    /// ## When This Occurs
    /// - Approving or rejecting a non-pending stock request
    /// - Accepting an already-resolved material return
    /// - Regenerating a finalized balance sheet, or one a later
    ///   finalized sheet has chained from
    #[error("{entity} {id} is {status}, cannot {operation}")]
    InvalidState {
        entity: String,
        id: String,
        status: String,
        operation: String,
    },

    /// A required parameter is absent on a report or request call.
    #[error("Missing required parameter: {field}")]
    MissingParameters { field: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidState error.
    pub fn invalid_state(
        entity: impl Into<String>,
        id: impl Into<String>,
        status: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        CoreError::InvalidState {
            entity: entity.into(),
            id: id.into(),
            status: status.into(),
            operation: operation.into(),
        }
    }

    /// Creates a MissingParameters error.
    pub fn missing(field: impl Into<String>) -> Self {
        CoreError::MissingParameters {
            field: field.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before ledger logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid month key, invalid item code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Document has no line items, or too many.
    #[error("document must have between 1 and {max} lines")]
    BadLineCount { max: usize },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message() {
        let err = CoreError::InsufficientStock {
            store_id: "S1".to_string(),
            item_id: "DROP-24F".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock in store S1 for item DROP-24F: available 3, requested 5"
        );
    }

    #[test]
    fn test_invalid_state_message() {
        let err = CoreError::invalid_state("StockRequest", "r1", "completed", "approve");
        assert_eq!(err.to_string(), "StockRequest r1 is completed, cannot approve");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "month".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
