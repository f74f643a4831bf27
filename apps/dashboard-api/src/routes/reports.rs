//! Dashboard and business report.

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use sanj_core::reports::{BusinessReport, ReportFilter};
use sanj_core::DASHBOARD_MONTHS;
use sanj_db::repository::report::Dashboard;
use tracing::debug;

use crate::error::ApiResult;
use crate::extract::{Json, Query};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/business", get(business))
}

async fn dashboard(State(state): State<AppState>) -> ApiResult<Json<Dashboard>> {
    let dashboard = state
        .db
        .reports()
        .dashboard(state.today(), state.config.low_stock_threshold, DASHBOARD_MONTHS)
        .await?;
    Ok(Json(dashboard))
}

/// `?from=2026-04-01&to=2026-09-30&kind=sale&debt_type=bank&...`
async fn business(
    State(state): State<AppState>,
    Query(filter): Query<ReportFilter>,
) -> ApiResult<Json<BusinessReport>> {
    debug!(filter = ?filter, "Building business report");
    let report = state
        .db
        .reports()
        .business_report(&filter, state.config.low_stock_threshold)
        .await?;
    Ok(Json(report))
}
