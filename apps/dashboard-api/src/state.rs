//! Shared application state.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use sanj_db::Database;

use crate::config::ApiConfig;

/// State handed to every handler.
///
/// Cloning is cheap: the database is a pooled handle and the configuration
/// is shared.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        AppState {
            db,
            config: Arc::new(config),
        }
    }

    /// The business date used for expiry, performance and snapshot labels.
    pub fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}
