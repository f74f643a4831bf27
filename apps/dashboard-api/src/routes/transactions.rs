//! Sales and purchases.
//!
//! Every write here fans out to the stock ledger and the finance ledger in
//! one SQL transaction (see `sanj_db::repository::transaction`).

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use sanj_core::inputs::TransactionInput;
use sanj_core::Transaction;
use sanj_db::{TransactionQuery, TransactionSummary};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::extract::{Json, Path, Query};
use crate::routes::{csv_attachment, or_na};
use crate::state::AppState;

const EXPORT_HEADER: &[&str] = &[
    "Date",
    "Type",
    "Customer",
    "Product",
    "Quantity",
    "Unit Price",
    "Discount",
    "CNF Commission",
    "Transport",
    "Total Amount",
    "Expected Return",
    "Payment Status",
    "Notes",
];

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/summary", get(summary))
        .route("/export.csv", get(export_csv))
        .route("/{id}", get(fetch).put(update).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<TransactionQuery>,
) -> ApiResult<Json<Vec<Transaction>>> {
    Ok(Json(state.db.transactions().list(&query).await?))
}

async fn create(
    State(state): State<AppState>,
    Json(input): Json<TransactionInput>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
    let transaction = state.db.transactions().create(&input).await?;
    info!(
        id = %transaction.id,
        kind = %transaction.kind,
        total = %transaction.total_amount,
        "Transaction recorded"
    );
    Ok((StatusCode::CREATED, Json(transaction)))
}

async fn fetch(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Transaction>> {
    state
        .db
        .transactions()
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Transaction", &id))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<TransactionInput>,
) -> ApiResult<Json<Transaction>> {
    Ok(Json(state.db.transactions().update(&id, &input).await?))
}

async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.db.transactions().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn summary(State(state): State<AppState>) -> ApiResult<Json<TransactionSummary>> {
    Ok(Json(state.db.transactions().summary().await?))
}

/// Same filters as the list.
async fn export_csv(State(state): State<AppState>, Query(query): Query<TransactionQuery>) -> ApiResult<Response> {
    let transactions = state.db.transactions().list(&query).await?;

    csv_attachment(
        "transactions-report",
        state.today(),
        EXPORT_HEADER,
        transactions.into_iter().map(|t| {
            vec![
                t.date.format("%Y-%m-%d").to_string(),
                t.kind.as_str().to_string(),
                t.customer_name,
                t.product_name,
                t.quantity.to_string(),
                t.unit_price.to_decimal_string(),
                t.discount.to_decimal_string(),
                t.cnf_commission.to_decimal_string(),
                t.transport_expense.to_decimal_string(),
                t.total_amount.to_decimal_string(),
                t.expected_return.to_decimal_string(),
                t.payment_status.as_str().to_string(),
                or_na(t.notes.as_deref()),
            ]
        }),
    )
}
