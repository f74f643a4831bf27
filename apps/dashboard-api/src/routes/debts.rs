//! Bank loans, investors and the two calculators the debt forms use.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use sanj_core::calc::{self, InvestorPosition};
use sanj_core::inputs::{BankDebtInput, InvestorInput};
use sanj_core::reports::DebtSummary;
use sanj_core::types::Rate;
use sanj_core::validation::{validate_non_negative, validate_rate, validate_tenure};
use sanj_core::{BankDebt, InvestorDebt, Money, MAX_INTEREST_BPS};

use crate::error::{ApiError, ApiResult};
use crate::extract::{Json, Path};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/banks", get(list_banks).post(create_bank))
        .route("/banks/{id}", get(fetch_bank).put(update_bank).delete(remove_bank))
        .route("/investors", get(list_investors).post(create_investor))
        .route(
            "/investors/{id}",
            get(fetch_investor).put(update_investor).delete(remove_investor),
        )
        .route("/summary", get(summary))
        .route("/emi-preview", post(emi_preview))
        .route("/investor-preview", post(investor_preview))
}

// =============================================================================
// Bank loans
// =============================================================================

async fn list_banks(State(state): State<AppState>) -> ApiResult<Json<Vec<BankDebt>>> {
    Ok(Json(state.db.debts().list_banks().await?))
}

async fn create_bank(
    State(state): State<AppState>,
    Json(input): Json<BankDebtInput>,
) -> ApiResult<(StatusCode, Json<BankDebt>)> {
    let debt = state.db.debts().create_bank(&input).await?;
    Ok((StatusCode::CREATED, Json(debt)))
}

async fn fetch_bank(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<BankDebt>> {
    state
        .db
        .debts()
        .get_bank(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Bank debt", &id))
}

async fn update_bank(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<BankDebtInput>,
) -> ApiResult<Json<BankDebt>> {
    Ok(Json(state.db.debts().update_bank(&id, &input).await?))
}

async fn remove_bank(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.db.debts().delete_bank(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Investors
// =============================================================================

async fn list_investors(State(state): State<AppState>) -> ApiResult<Json<Vec<InvestorDebt>>> {
    Ok(Json(state.db.debts().list_investors().await?))
}

async fn create_investor(
    State(state): State<AppState>,
    Json(input): Json<InvestorInput>,
) -> ApiResult<(StatusCode, Json<InvestorDebt>)> {
    let investor = state.db.debts().create_investor(&input).await?;
    Ok((StatusCode::CREATED, Json(investor)))
}

async fn fetch_investor(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<InvestorDebt>> {
    state
        .db
        .debts()
        .get_investor(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Investor", &id))
}

async fn update_investor(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<InvestorInput>,
) -> ApiResult<Json<InvestorDebt>> {
    Ok(Json(state.db.debts().update_investor(&id, &input).await?))
}

async fn remove_investor(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    state.db.debts().delete_investor(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn summary(State(state): State<AppState>) -> ApiResult<Json<DebtSummary>> {
    Ok(Json(state.db.debts().summary().await?))
}

// =============================================================================
// Calculators
// =============================================================================

#[derive(Debug, Deserialize)]
struct EmiRequest {
    loan_amount: Money,
    interest_rate: Rate,
    tenure_months: i64,
}

#[derive(Debug, Serialize)]
struct EmiPreview {
    monthly_emi: Money,
    total_payable: Money,
    total_interest: Money,
}

/// Live EMI figure for the bank loan form. Nothing is stored.
async fn emi_preview(Json(request): Json<EmiRequest>) -> ApiResult<Json<EmiPreview>> {
    validate_non_negative("loan_amount", request.loan_amount)?;
    validate_rate("interest_rate", request.interest_rate, MAX_INTEREST_BPS)?;
    // A zero or negative tenure is a calculation error, not a form error
    let monthly_emi = calc::calculate_emi(request.loan_amount, request.interest_rate, request.tenure_months)?;
    validate_tenure(request.tenure_months)?;
    let total_payable = monthly_emi * request.tenure_months;

    Ok(Json(EmiPreview {
        monthly_emi,
        total_payable,
        total_interest: (total_payable - request.loan_amount).non_negative(),
    }))
}

#[derive(Debug, Deserialize)]
struct InvestorRequest {
    principal_invested: Money,
    roi: Rate,
    #[serde(default)]
    partial_withdrawal: Money,
    #[serde(default)]
    skipped_roi: bool,
}

async fn investor_preview(Json(request): Json<InvestorRequest>) -> ApiResult<Json<InvestorPosition>> {
    validate_non_negative("principal_invested", request.principal_invested)?;
    validate_non_negative("partial_withdrawal", request.partial_withdrawal)?;
    validate_rate("roi", request.roi, MAX_INTEREST_BPS)?;
    Ok(Json(calc::investor_position(
        request.principal_invested,
        request.roi,
        request.partial_withdrawal,
        request.skipped_roi,
    )))
}
