//! Sale, expense and damage routes.

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use khata_core::trade::{
    DamageRecord, Expense, RecordDamageRequest, RecordExpenseRequest, RecordSaleRequest, Sale,
};

use crate::{
    AppState,
    error::{ApiJson, ApiResult},
    middleware::AuthUser,
    routes::proofs,
};

/// Creates the trade routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sales", post(record_sale))
        .route("/expenses", post(record_expense))
        .route("/damages", post(record_damage))
}

/// POST `/sales`
async fn record_sale(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(payload): ApiJson<RecordSaleRequest>,
) -> ApiResult<(StatusCode, Json<Sale>)> {
    proofs::ensure_uploaded(&state, &auth, payload.proof_image.as_deref()).await?;
    let sale = state.repository.record_sale(auth.caller(), &payload).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

/// POST `/expenses`
async fn record_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(payload): ApiJson<RecordExpenseRequest>,
) -> ApiResult<(StatusCode, Json<Expense>)> {
    proofs::ensure_uploaded(&state, &auth, payload.proof_image.as_deref()).await?;
    let expense = state
        .repository
        .record_expense(auth.caller(), &payload)
        .await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

/// POST `/damages`
async fn record_damage(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(payload): ApiJson<RecordDamageRequest>,
) -> ApiResult<(StatusCode, Json<DamageRecord>)> {
    let damage = state
        .repository
        .record_damage(auth.caller(), &payload)
        .await?;
    Ok((StatusCode::CREATED, Json(damage)))
}
