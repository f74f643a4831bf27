//! # Sanj Dashboard API
//!
//! JSON HTTP API and CSV downloads behind the back-office dashboard.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Dashboard API Server                             │
//! │                                                                         │
//! │  Browser ───► HTTP (8080) ───► routes::* ───► sanj-db ───► SQLite       │
//! │                                   │                                     │
//! │                                   ▼                                     │
//! │                              sanj-core                                  │
//! │                    (EMI, schemes, summaries, reports)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Environment configuration
//! - [`error`] - `ApiError` and the HTTP status mapping
//! - [`extract`] - `Json` / `Query` / `Path` that reject with `ApiError`
//! - [`routes`] - One router per tab, plus `/health`
//! - [`state`] - Shared handler state

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::router;
pub use state::AppState;
