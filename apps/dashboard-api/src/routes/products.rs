//! Product catalog endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use sanj_core::inputs::ProductInput;
use sanj_core::{BatchBalance, Product};
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::extract::{Json, Path, Query};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/low-stock", get(low_stock))
        .route("/expiring", get(expiring))
        .route("/categories", get(categories))
        .route("/{id}", get(fetch).put(update).delete(remove))
        .route("/{id}/batches", get(batches))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ThresholdParams {
    #[serde(default)]
    pub threshold: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WindowParams {
    #[serde(default)]
    pub days: Option<i64>,
}

async fn list(State(state): State<AppState>, Query(params): Query<SearchParams>) -> ApiResult<Json<Vec<Product>>> {
    debug!(search = ?params.search, "Listing products");
    Ok(Json(state.db.products().list(params.search.as_deref()).await?))
}

async fn create(
    State(state): State<AppState>,
    Json(input): Json<ProductInput>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let product = state.db.products().create(&input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn fetch(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Product>> {
    state
        .db
        .products()
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product", &id))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<ProductInput>,
) -> ApiResult<Json<Product>> {
    Ok(Json(state.db.products().update(&id, &input).await?))
}

async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.db.products().soft_delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn low_stock(
    State(state): State<AppState>,
    Query(params): Query<ThresholdParams>,
) -> ApiResult<Json<Vec<Product>>> {
    let threshold = params.threshold.unwrap_or(state.config.low_stock_threshold);
    Ok(Json(state.db.products().low_stock(threshold).await?))
}

async fn expiring(State(state): State<AppState>, Query(params): Query<WindowParams>) -> ApiResult<Json<Vec<Product>>> {
    let days = params.days.unwrap_or(state.config.expiry_window_days);
    Ok(Json(state.db.products().expiring(state.today(), days).await?))
}

async fn categories(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(state.db.products().categories().await?))
}

async fn batches(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Vec<BatchBalance>>> {
    Ok(Json(state.db.stock().batch_balances(&id).await?))
}
