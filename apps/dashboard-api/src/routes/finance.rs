//! Income / expense ledger and the monthly report snapshots.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use chrono::NaiveDate;
use serde::Deserialize;
use sanj_core::inputs::FinanceInput;
use sanj_core::reports::{FinanceSummary, MonthlyFigures};
use sanj_core::{FinanceRecord, ReportSnapshot, DASHBOARD_MONTHS};
use sanj_db::{FinancePage, FinanceQuery};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::extract::{Json, Path, Query};
use crate::routes::{csv_attachment, or_na};
use crate::state::AppState;

const EXPORT_HEADER: &[&str] = &[
    "Date",
    "Type",
    "Source",
    "Category",
    "Amount",
    "Description",
    "Linked Tab",
    "Reference",
    "Notes",
];

/// Upper bound for `?months=` on the monthly series.
const MAX_MONTHS: usize = 36;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/summary", get(summary))
        .route("/monthly", get(monthly))
        .route("/export.csv", get(export_csv))
        .route("/snapshots", get(snapshots).post(export_snapshot))
        .route("/{id}", get(fetch).put(update).delete(remove))
}

#[derive(Debug, Default, Deserialize)]
struct RangeParams {
    #[serde(default)]
    from: Option<NaiveDate>,
    #[serde(default)]
    to: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
struct MonthsParams {
    #[serde(default)]
    months: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct SnapshotRequest {
    #[serde(default)]
    exported_by: Option<String>,
}

async fn list(State(state): State<AppState>, Query(mut query): Query<FinanceQuery>) -> ApiResult<Json<FinancePage>> {
    if query.page_size.is_none() {
        query.page_size = Some(state.config.page_size);
    }
    Ok(Json(state.db.finance().list(&query).await?))
}

async fn create(
    State(state): State<AppState>,
    Json(input): Json<FinanceInput>,
) -> ApiResult<(StatusCode, Json<FinanceRecord>)> {
    let record = state.db.finance().create(&input).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn fetch(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<FinanceRecord>> {
    state
        .db
        .finance()
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Finance record", &id))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<FinanceInput>,
) -> ApiResult<Json<FinanceRecord>> {
    Ok(Json(state.db.finance().update(&id, &input).await?))
}

async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.db.finance().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn summary(State(state): State<AppState>, Query(range): Query<RangeParams>) -> ApiResult<Json<FinanceSummary>> {
    Ok(Json(state.db.finance().summary(range.from, range.to).await?))
}

async fn monthly(
    State(state): State<AppState>,
    Query(params): Query<MonthsParams>,
) -> ApiResult<Json<Vec<MonthlyFigures>>> {
    let months = params.months.unwrap_or(DASHBOARD_MONTHS);
    if months == 0 || months > MAX_MONTHS {
        return Err(ApiError::validation(format!("months must be between 1 and {}", MAX_MONTHS)));
    }
    Ok(Json(state.db.finance().monthly(months).await?))
}

async fn snapshots(State(state): State<AppState>) -> ApiResult<Json<Vec<ReportSnapshot>>> {
    Ok(Json(state.db.reports().list_snapshots().await?))
}

/// Stores the current totals as this month's snapshot.
async fn export_snapshot(
    State(state): State<AppState>,
    Json(request): Json<SnapshotRequest>,
) -> ApiResult<(StatusCode, Json<ReportSnapshot>)> {
    let snapshot = state
        .db
        .reports()
        .export_snapshot(state.today(), request.exported_by.as_deref())
        .await?;
    info!(month = %snapshot.month, records = snapshot.record_count, "Finance snapshot exported");
    Ok((StatusCode::CREATED, Json(snapshot)))
}

async fn export_csv(State(state): State<AppState>, Query(range): Query<RangeParams>) -> ApiResult<Response> {
    let records = state.db.finance().all(range.from, range.to).await?;

    csv_attachment(
        "finance-report",
        state.today(),
        EXPORT_HEADER,
        records.into_iter().map(|r| {
            vec![
                r.date.format("%Y-%m-%d").to_string(),
                r.kind.as_str().to_string(),
                r.source,
                r.category,
                r.amount.to_decimal_string(),
                or_na(r.description.as_deref()),
                or_na(r.linked_tab.as_deref()),
                or_na(r.reference.as_deref()),
                or_na(r.notes.as_deref()),
            ]
        }),
    )
}
