//! Stock ledger endpoints and the stock CSV download.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use sanj_core::inputs::{StockCorrectionInput, StockPurchaseInput, StockSaleInput};
use sanj_core::StockEntry;
use sanj_db::repository::stock::SchemeSale;

use crate::error::ApiResult;
use crate::extract::{Json, Query};
use crate::routes::{csv_attachment, or_na};
use crate::state::AppState;

const DEFAULT_ENTRY_LIMIT: u32 = 200;
const EXPORT_HEADER: &[&str] = &[
    "Product Name",
    "Batch No.",
    "Available Quantity",
    "Purchase Rate",
    "Sale Rate",
    "Stock Value",
    "Supplier",
    "Last Updated",
];

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/entries", get(entries))
        .route("/purchase", post(purchase))
        .route("/sale", post(sale))
        .route("/scheme-sale", post(scheme_sale))
        .route("/return", post(stock_return))
        .route("/adjustment", post(adjustment))
        .route("/export.csv", get(export_csv))
}

#[derive(Debug, Default, Deserialize)]
struct EntryParams {
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    limit: Option<u32>,
}

async fn entries(State(state): State<AppState>, Query(params): Query<EntryParams>) -> ApiResult<Json<Vec<StockEntry>>> {
    let limit = params.limit.unwrap_or(DEFAULT_ENTRY_LIMIT).clamp(1, 1_000);
    Ok(Json(state.db.stock().list_entries(params.search.as_deref(), limit).await?))
}

async fn purchase(
    State(state): State<AppState>,
    Json(input): Json<StockPurchaseInput>,
) -> ApiResult<(StatusCode, Json<StockEntry>)> {
    let entry = state.db.stock().record_purchase(&input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn sale(
    State(state): State<AppState>,
    Json(input): Json<StockSaleInput>,
) -> ApiResult<(StatusCode, Json<StockEntry>)> {
    let entry = state.db.stock().record_sale(&input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn scheme_sale(
    State(state): State<AppState>,
    Json(input): Json<StockSaleInput>,
) -> ApiResult<(StatusCode, Json<SchemeSale>)> {
    let outcome = state.db.stock().record_scheme_sale(&input).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

async fn stock_return(
    State(state): State<AppState>,
    Json(input): Json<StockCorrectionInput>,
) -> ApiResult<(StatusCode, Json<StockEntry>)> {
    let entry = state.db.stock().record_return(&input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn adjustment(
    State(state): State<AppState>,
    Json(input): Json<StockCorrectionInput>,
) -> ApiResult<(StatusCode, Json<StockEntry>)> {
    let entry = state.db.stock().record_adjustment(&input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn export_csv(State(state): State<AppState>) -> ApiResult<Response> {
    let rows = state.db.stock().export_rows().await?;

    csv_attachment(
        "stock-report",
        state.today(),
        EXPORT_HEADER,
        rows.into_iter().map(|row| {
            vec![
                row.product_name,
                row.batch,
                row.available_quantity.to_string(),
                row.purchase_rate.to_decimal_string(),
                row.sale_rate.to_decimal_string(),
                row.stock_value.to_decimal_string(),
                or_na(row.supplier.as_deref()),
                row.last_updated.format("%Y-%m-%d").to_string(),
            ]
        }),
    )
}
