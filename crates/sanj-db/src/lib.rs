//! # sanj-db: Database Layer for the Sanj Back Office
//!
//! SQLite storage with sqlx. Repositories own the SQL; every write that
//! touches more than one table (stock counter + stock ledger + finance
//! ledger) runs inside a single SQL transaction.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sanj Data Flow                                   │
//! │                                                                         │
//! │  HTTP handler (POST /api/transactions)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                     sanj-db (THIS CRATE)                        │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────────┐    ┌─────────────────┐    ┌──────────────┐  │    │
//! │  │   │   Database    │    │  Repositories   │    │  Migrations  │  │    │
//! │  │   │   (pool.rs)   │    │                 │    │  (embedded)  │  │    │
//! │  │   │               │    │ Product  Stock  │    │              │  │    │
//! │  │   │ SqlitePool    │◄───│ Customer Finance│    │ 001_initial  │  │    │
//! │  │   │               │    │ Transaction Debt│    │              │  │    │
//! │  │   │               │    │ Marketing Report│    │              │  │    │
//! │  │   └───────────────┘    └─────────────────┘    └──────────────┘  │    │
//! │  │                                                                 │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                     SQLite Database (sanj.db, WAL)              │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sanj_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./sanj.db")).await?;
//! let low = db.products().low_stock(10).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::customer::CustomerRepository;
pub use repository::debt::DebtRepository;
pub use repository::finance::{FinancePage, FinanceQuery, FinanceRepository};
pub use repository::marketing::MarketingRepository;
pub use repository::product::ProductRepository;
pub use repository::report::ReportRepository;
pub use repository::stock::{StockExportRow, StockRepository};
pub use repository::transaction::{TransactionQuery, TransactionRepository, TransactionSummary};
