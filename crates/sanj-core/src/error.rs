//! # Error Types
//!
//! Domain-specific error types for sanj-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  sanj-core errors (this file)                                          │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  sanj-db errors (separate crate)                                       │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  dashboard-api errors (in app)                                         │
//! │  └── ApiError         - What the HTTP client sees (JSON)               │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Not enough units to complete a sale.
    ///
    /// ## When This Occurs
    /// - Selling more than a batch holds
    /// - A scheme sale whose billed + free units exceed the batch
    /// - A transaction sale larger than the product counter without the
    ///   oversell flag
    ///
    /// ## User Workflow
    /// ```text
    /// Record sale (batch CSF2301, qty: 40)
    ///      │
    ///      ▼
    /// Batch balance: 29
    ///      │
    ///      ▼
    /// InsufficientStock { product: "CALSANZ FEM CAP", available: 29, requested: 40 }
    ///      │
    ///      ▼
    /// Client shows: "Insufficient stock! Only 29 units available"
    /// ```
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// A formula was asked for an undefined result (e.g. EMI over zero months).
    #[error("Invalid calculation: {reason}")]
    InvalidCalculation { reason: String },

    /// A status change that the lifecycle does not permit.
    #[error("{entity} cannot move from {from} to {to}")]
    InvalidStatusTransition {
        entity: String,
        from: String,
        to: String,
    },

    /// Entity referenced by a business operation does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Operation conflicts with existing data (e.g. deleting a referenced customer).
    #[error("Conflict: {reason}")]
    Conflict { reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates an InvalidCalculation error.
    pub fn invalid_calculation(reason: impl Into<String>) -> Self {
        CoreError::InvalidCalculation {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These run before anything touches the database.
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

    /// Invalid format (e.g., invalid UUID, malformed amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Two fields are inconsistent (e.g. end date before start date).
    #[error("{field} {reason}")]
    Inconsistent { field: String, reason: String },
}

impl ValidationError {
    /// Creates a Required error.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// An amount beyond [`MAX_AMOUNT`](crate::MAX_AMOUNT), or arithmetic on
    /// one that would overflow.
    pub fn too_large(field: impl Into<String>) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min: 0,
            max: crate::MAX_AMOUNT,
        }
    }
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
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product: "CALSANZ FEM CAP".to_string(),
            available: 29,
            requested: 40,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for CALSANZ FEM CAP: available 29, requested 40"
        );

        let err = CoreError::InvalidStatusTransition {
            entity: "Agreement".to_string(),
            from: "completed".to_string(),
            to: "active".to_string(),
        };
        assert_eq!(err.to_string(), "Agreement cannot move from completed to active");
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(ValidationError::required("doctor_name").to_string(), "doctor_name is required");

        let err = ValidationError::Inconsistent {
            field: "agreement_end".to_string(),
            reason: "must be after agreement_start".to_string(),
        };
        assert_eq!(err.to_string(), "agreement_end must be after agreement_start");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("batch").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
