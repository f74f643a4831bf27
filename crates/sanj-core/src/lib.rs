//! # sanj-core: Pure Business Logic for the Sanj Back Office
//!
//! This crate holds the rules of the healthcare-distribution back office as
//! pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sanj Back Office                                 │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                  dashboard-api (axum, JSON + CSV)               │    │
//! │  │   /api/products  /api/transactions  /api/finance  /api/debts   │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │               ★ sanj-core (THIS CRATE) ★                        │    │
//! │  │                                                                 │    │
//! │  │   ┌─────────┐  ┌─────────┐  ┌─────────┐  ┌──────────┐          │    │
//! │  │   │  types  │  │  money  │  │  calc   │  │  scheme  │          │    │
//! │  │   │ Product │  │  Money  │  │  EMI    │  │  "10+2"  │          │    │
//! │  │   │  Debt   │  │  paise  │  │  ROI    │  │  "15%"   │          │    │
//! │  │   └─────────┘  └─────────┘  └─────────┘  └──────────┘          │    │
//! │  │   ┌─────────┐  ┌──────────┐  ┌─────────┐                       │    │
//! │  │   │ inputs  │  │validation│  │ reports │                       │    │
//! │  │   └─────────┘  └──────────┘  └─────────┘                       │    │
//! │  │                                                                 │    │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │                    sanj-db (Database Layer)                     │    │
//! │  │        SQLite queries, migrations, repositories, ledger sync    │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (Product, Transaction, BankDebt, ...)
//! - [`money`] - Money in integer paise
//! - [`calc`] - EMI, ROI, expected return and trade price formulas
//! - [`scheme`] - Bonus scheme parsing ("10+2", "15%")
//! - [`inputs`] - Create/update payloads with their validation
//! - [`validation`] - Field-level rules
//! - [`reports`] - Dashboard and business report aggregation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use sanj_core::calc::calculate_emi;
//! use sanj_core::money::Money;
//! use sanj_core::types::Rate;
//!
//! // ₹1,00,000 at 12% for 12 months
//! let emi = calculate_emi(Money::from_rupees(100_000), Rate::from_bps(1200), 12).unwrap();
//! assert_eq!(emi.paise(), 888_488);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod calc;
pub mod error;
pub mod inputs;
pub mod money;
pub mod reports;
pub mod scheme;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use scheme::BonusScheme;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum units on a single transaction or stock movement.
pub const MAX_QUANTITY: i64 = 1_000_000;

/// Largest single amount accepted, in paise (₹1,000 crore).
///
/// `MAX_AMOUNT × MAX_QUANTITY` stays inside `i64`.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// Longest loan tenure accepted (50 years).
pub const MAX_TENURE_MONTHS: i64 = 600;

/// Upper bound for interest and ROI rates (100%).
pub const MAX_INTEREST_BPS: u32 = 10_000;

/// Maximum length of names, categories and other short text.
pub const MAX_NAME_LENGTH: usize = 200;

/// Maximum length of notes, descriptions and addresses.
pub const MAX_NOTES_LENGTH: usize = 1000;

/// Largest page a list endpoint will return.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Finance table page size.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Products at or below this many units are flagged as low stock.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

/// Batches expiring within this many days are flagged.
pub const DEFAULT_EXPIRY_WINDOW_DAYS: i64 = 90;

/// Widest expiry look-ahead accepted (ten years).
pub const MAX_EXPIRY_WINDOW_DAYS: i64 = 3650;

/// Months shown on the dashboard finance chart.
pub const DASHBOARD_MONTHS: usize = 6;
