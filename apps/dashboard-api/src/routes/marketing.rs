//! Doctor marketing agreements.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use sanj_core::inputs::AgreementInput;
use sanj_core::reports::MarketingSummary;
use sanj_core::MarketingAgreement;
use sanj_db::repository::marketing::AgreementView;

use crate::error::{ApiError, ApiResult};
use crate::extract::{Json, Path};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/summary", get(summary))
        .route("/doctors", get(doctors))
        .route("/{id}", get(fetch).put(update).delete(remove))
}

/// Agreements with their performance as of today.
async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<AgreementView>>> {
    Ok(Json(state.db.marketing().list(state.today()).await?))
}

async fn create(
    State(state): State<AppState>,
    Json(input): Json<AgreementInput>,
) -> ApiResult<(StatusCode, Json<MarketingAgreement>)> {
    let agreement = state.db.marketing().create(&input).await?;
    Ok((StatusCode::CREATED, Json(agreement)))
}

async fn fetch(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<AgreementView>> {
    let agreement = state
        .db
        .marketing()
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Agreement", &id))?;
    let performance = agreement.performance(state.today());

    Ok(Json(AgreementView { agreement, performance }))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<AgreementInput>,
) -> ApiResult<Json<MarketingAgreement>> {
    Ok(Json(state.db.marketing().update(&id, &input).await?))
}

async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.db.marketing().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Names for the doctor picklist on the agreement form.
async fn doctors(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(state.db.marketing().doctors().await?))
}

async fn summary(State(state): State<AppState>) -> ApiResult<Json<MarketingSummary>> {
    Ok(Json(state.db.marketing().summary(state.today()).await?))
}
