//! # Validation Module
//!
//! Field-level validators shared by every input payload.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractors (axum Json / Query)                          │
//! │  └── Shape and type checks (deserialization)                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Input payloads (inputs.rs)                                   │
//! │  └── THIS MODULE: per-field business rules                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use sanj_core::validation::{validate_batch, validate_quantity};
//!
//! assert!(validate_batch("CSF2301").is_ok());
//! assert!(validate_quantity(0).is_err());
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::Rate;
use crate::{MAX_AMOUNT, MAX_EXPIRY_WINDOW_DAYS, MAX_PAGE_SIZE, MAX_QUANTITY, MAX_TENURE_MONTHS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required free-text name (product, customer, bank, doctor).
///
/// ## Rules
/// - Must not be blank
/// - At most `max` characters
pub fn validate_name(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates an optional free-text field (notes, address, ...).
pub fn validate_optional_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<()> {
    match value {
        Some(v) if v.chars().count() > max => Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        }),
        _ => Ok(()),
    }
}

/// Validates a manufacturer batch number.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Letters, digits, hyphens, underscores and slashes only
///
/// ## Example
/// ```rust
/// use sanj_core::validation::validate_batch;
///
/// assert!(validate_batch("NPI2305").is_ok());
/// assert!(validate_batch("B 01").is_err());
/// ```
pub fn validate_batch(batch: &str) -> ValidationResult<()> {
    let batch = batch.trim();

    if batch.is_empty() {
        return Err(ValidationError::required("batch"));
    }

    if batch.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "batch".to_string(),
            max: 50,
        });
    }

    if !batch
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '/'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "batch".to_string(),
            reason: "must contain only letters, numbers, hyphens, underscores and slashes".to_string(),
        });
    }

    Ok(())
}

/// Validates a GSTIN (15 alphanumeric characters) when present.
pub fn validate_gst_number(gst: Option<&str>) -> ValidationResult<()> {
    let Some(gst) = gst.map(str::trim).filter(|g| !g.is_empty()) else {
        return Ok(());
    };

    if gst.len() != 15 || !gst.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: "gst_number".to_string(),
            reason: "must be 15 letters or digits".to_string(),
        });
    }

    Ok(())
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (no filter)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a unit quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a signed stock adjustment (non-zero, bounded both ways).
pub fn validate_adjustment(qty: i64) -> ValidationResult<()> {
    if qty == 0 || qty.unsigned_abs() > MAX_QUANTITY.unsigned_abs() {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: -MAX_QUANTITY,
            max: MAX_QUANTITY,
        });
    }

    Ok(())
}

/// Validates an expiry look-ahead in days.
pub fn validate_expiry_window(days: i64) -> ValidationResult<()> {
    if !(0..=MAX_EXPIRY_WINDOW_DAYS).contains(&days) {
        return Err(ValidationError::OutOfRange {
            field: "days".to_string(),
            min: 0,
            max: MAX_EXPIRY_WINDOW_DAYS,
        });
    }

    Ok(())
}

/// Validates that an amount is between zero and [`MAX_AMOUNT`].
///
/// ## Example
/// ```rust
/// use sanj_core::money::Money;
/// use sanj_core::validation::validate_non_negative;
///
/// assert!(validate_non_negative("discount", Money::zero()).is_ok());
/// assert!(validate_non_negative("discount", Money::from_paise(-1)).is_err());
/// assert!(validate_non_negative("discount", Money::from_paise(i64::MAX)).is_err());
/// ```
pub fn validate_non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() || amount.paise() > MAX_AMOUNT {
        return Err(ValidationError::too_large(field));
    }

    Ok(())
}

/// Validates that an amount is above zero and at most [`MAX_AMOUNT`].
pub fn validate_positive(field: &str, amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    if amount.paise() > MAX_AMOUNT {
        return Err(ValidationError::too_large(field));
    }

    Ok(())
}

/// Validates a rate against an upper bound in basis points.
pub fn validate_rate(field: &str, rate: Rate, max_bps: u32) -> ValidationResult<()> {
    if rate.bps() > max_bps {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: max_bps as i64,
        });
    }

    Ok(())
}

/// Validates a loan tenure in months (1 to MAX_TENURE_MONTHS).
pub fn validate_tenure(months: i64) -> ValidationResult<()> {
    if !(1..=MAX_TENURE_MONTHS).contains(&months) {
        return Err(ValidationError::OutOfRange {
            field: "tenure_months".to_string(),
            min: 1,
            max: MAX_TENURE_MONTHS,
        });
    }

    Ok(())
}

/// Validates that a paid amount does not exceed the agreed amount.
pub fn validate_paid_within(paid: Money, amount: Money) -> ValidationResult<()> {
    if paid > amount {
        return Err(ValidationError::Inconsistent {
            field: "paid_amount".to_string(),
            reason: "cannot exceed agreement_amount".to_string(),
        });
    }

    Ok(())
}

/// Validates pagination parameters.
pub fn validate_page(page: u32, page_size: u32) -> ValidationResult<()> {
    if page == 0 {
        return Err(ValidationError::MustBePositive {
            field: "page".to_string(),
        });
    }

    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(ValidationError::OutOfRange {
            field: "page_size".to_string(),
            min: 1,
            max: MAX_PAGE_SIZE as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Date Validators
// =============================================================================

/// Validates that `start` is strictly before `end`.
pub fn validate_date_order(
    start_field: &str,
    start: NaiveDate,
    end_field: &str,
    end: NaiveDate,
) -> ValidationResult<()> {
    if start >= end {
        return Err(ValidationError::Inconsistent {
            field: end_field.to_string(),
            reason: format!("must be after {}", start_field),
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use sanj_core::validation::validate_uuid;
///
/// assert!(validate_uuid("product_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("product_id", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::required(field));
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
