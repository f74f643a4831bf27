//! Customer endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use sanj_core::inputs::CustomerInput;
use sanj_core::Customer;

use crate::error::{ApiError, ApiResult};
use crate::extract::{Json, Path, Query};
use crate::routes::products::SearchParams;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(fetch).put(update).delete(remove))
}

async fn list(State(state): State<AppState>, Query(params): Query<SearchParams>) -> ApiResult<Json<Vec<Customer>>> {
    Ok(Json(state.db.customers().list(params.search.as_deref()).await?))
}

async fn create(
    State(state): State<AppState>,
    Json(input): Json<CustomerInput>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    let customer = state.db.customers().create(&input).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

async fn fetch(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Customer>> {
    state
        .db
        .customers()
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Customer", &id))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<CustomerInput>,
) -> ApiResult<Json<Customer>> {
    Ok(Json(state.db.customers().update(&id, &input).await?))
}

async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.db.customers().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
