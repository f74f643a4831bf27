//! # Repository Module
//!
//! Database repository implementations, one per back-office tab.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP handler                                                           │
//! │       │                                                                 │
//! │       │  db.transactions().create(&input)                               │
//! │       ▼                                                                 │
//! │  TransactionRepository                                                  │
//! │  ├── BEGIN                                                              │
//! │  ├── INSERT transactions                                                │
//! │  ├── stock::record_movement      (ledger row + product counter)         │
//! │  ├── finance::post_entry × n     (Sales / CNF / Transportation)         │
//! │  └── COMMIT                                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cross-table helpers take `&mut SqliteConnection`, so they run on whatever
//! transaction the caller has open.
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalog CRUD, low stock, expiry
//! - [`customer::CustomerRepository`] - Customer CRUD
//! - [`stock::StockRepository`] - Batch ledger, purchases, sales, schemes
//! - [`transaction::TransactionRepository`] - Sales / purchases with sync
//! - [`finance::FinanceRepository`] - Income / expense ledger
//! - [`debt::DebtRepository`] - Bank loans and investors
//! - [`marketing::MarketingRepository`] - Doctor agreements
//! - [`report::ReportRepository`] - Monthly snapshots and report inputs

pub mod customer;
pub mod debt;
pub mod finance;
pub mod marketing;
pub mod product;
pub mod report;
pub mod stock;
pub mod transaction;
