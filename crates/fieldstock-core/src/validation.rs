//! # Validation Module
//!
//! Input validation for ledger documents.
//!
//! Runs before any ledger logic: document operations validate their
//! input up front, then the database layer enforces the same rules
//! again with NOT NULL / UNIQUE / CHECK constraints.
//!
//! ## Usage
//! ```rust
//! use fieldstock_core::validation::{validate_item_code, validate_quantity};
//!
//! validate_item_code("DROP-24F").unwrap();
//! validate_quantity(40).unwrap();
//! ```

use crate::error::ValidationError;
use crate::{MAX_DOCUMENT_LINES, MAX_LINE_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates an item code.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use fieldstock_core::validation::validate_item_code;
///
/// assert!(validate_item_code("DROP-24F").is_ok());
/// assert!(validate_item_code("").is_err());
/// assert!(validate_item_code("bad code").is_err());
/// ```
pub fn validate_item_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 50,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a display name (item or store).
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates that a caller-supplied reference (store id, contractor id,
/// user name) is present.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Quantity Validators
// =============================================================================

/// Validates a document line quantity.
///
/// Document lines always carry positive quantities; direction comes
/// from the movement type, not the sign.
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if quantity > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a document's line count.
pub fn validate_line_count(lines: usize) -> ValidationResult<()> {
    if lines == 0 || lines > MAX_DOCUMENT_LINES {
        return Err(ValidationError::BadLineCount {
            max: MAX_DOCUMENT_LINES,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_item_code() {
        assert!(validate_item_code("DROP-24F").is_ok());
        assert!(validate_item_code("ont_g240").is_ok());
        assert!(validate_item_code("").is_err());
        assert!(validate_item_code("   ").is_err());
        assert!(validate_item_code(&"A".repeat(51)).is_err());
        assert!(validate_item_code("has space").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-5).is_err());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_line_count() {
        assert!(validate_line_count(1).is_ok());
        assert!(validate_line_count(MAX_DOCUMENT_LINES).is_ok());
        assert!(validate_line_count(0).is_err());
        assert!(validate_line_count(MAX_DOCUMENT_LINES + 1).is_err());
    }

    #[test]
    fn test_validate_required() {
        assert!(validate_required("store_id", "S1").is_ok());
        assert!(validate_required("store_id", " ").is_err());
    }
}
