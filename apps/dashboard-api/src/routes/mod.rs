//! # HTTP Routes
//!
//! One module per back-office tab. Handlers are thin: extract, call the
//! repository, wrap the result in JSON.
//!
//! ## Route Map
//! ```text
//! /health
//! /api/products        /api/customers       /api/stock
//! /api/transactions    /api/finance         /api/debts
//! /api/marketing       /api/reports
//! ```

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::extract::Json;
use crate::state::AppState;

pub mod customers;
pub mod debts;
pub mod finance;
pub mod marketing;
pub mod products;
pub mod reports;
pub mod stock;
pub mod transactions;

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/products", products::routes())
        .nest("/api/customers", customers::routes())
        .nest("/api/stock", stock::routes())
        .nest("/api/transactions", transactions::routes())
        .nest("/api/finance", finance::routes())
        .nest("/api/debts", debts::routes())
        .nest("/api/marketing", marketing::routes())
        .nest("/api/reports", reports::routes())
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    database: bool,
    migrations_applied: usize,
    migrations_total: usize,
}

/// Health check endpoint.
async fn health(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let database = state.db.health_check().await;
    let (migrations_total, migrations_applied) = state.db.migration_status().await?;

    Ok(Json(HealthResponse {
        status: if database { "ok" } else { "degraded" },
        database,
        migrations_applied,
        migrations_total,
    }))
}

// =============================================================================
// CSV downloads
// =============================================================================

/// Renders rows as CSV and wraps them as a dated attachment
/// (`{stem}-YYYY-MM-DD.csv`).
pub(crate) fn csv_attachment(
    stem: &str,
    today: chrono::NaiveDate,
    header: &[&str],
    rows: impl IntoIterator<Item = Vec<String>>,
) -> ApiResult<Response> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(header).map_err(csv_error)?;
    for row in rows {
        writer.write_record(&row).map_err(csv_error)?;
    }
    let body = writer
        .into_inner()
        .map_err(|e| ApiError::internal(format!("CSV buffer: {}", e)))?;

    let disposition = format!("attachment; filename=\"{}-{}.csv\"", stem, today.format("%Y-%m-%d"));

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

fn csv_error(err: csv::Error) -> ApiError {
    tracing::error!("CSV export failed: {}", err);
    ApiError::internal("CSV export failed")
}

/// `Some(text)` or "N/A", the way blank cells read in the downloads.
pub(crate) fn or_na(value: Option<&str>) -> String {
    value.filter(|v| !v.is_empty()).unwrap_or("N/A").to_string()
}
