//! Cheque routes: listing, single transitions and batch cash-out.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use khata_core::cheque::{CashOutItem, ChequeAction, ChequeState, ChequeView};
use khata_shared::types::ChequeId;
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    error::{ApiError, ApiJson, ApiQuery, ApiResult},
    middleware::AuthUser,
};

/// Creates the cheque routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cheques", get(list_cheques))
        .route("/cheques/cash-out", post(cash_out_batch))
        .route("/cheques/{id}", get(get_cheque))
        .route("/cheques/{id}/transitions", post(transition_cheque))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing cheques.
#[derive(Debug, Deserialize)]
pub struct ListChequesQuery {
    /// Restrict to one state.
    pub state: Option<String>,
}

/// Request body for a batch cash-out.
#[derive(Debug, Deserialize)]
pub struct CashOutBatchRequest {
    /// Cheques to clear.
    pub items: Vec<CashOutItem>,
}

/// Outcome of one batch item.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashOutItemResult {
    /// Cheque the item referred to.
    pub cheque_id: ChequeId,
    /// Whether the cheque was cleared.
    pub success: bool,
    /// The cleared cheque.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cheque: Option<ChequeView>,
    /// Error code when the item failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
    /// Reason the item failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Summary of a batch cash-out.
#[derive(Debug, Serialize)]
pub struct CashOutBatchResponse {
    /// Items cleared.
    pub succeeded: usize,
    /// Items refused.
    pub failed: usize,
    /// Per-item outcomes, in request order.
    pub results: Vec<CashOutItemResult>,
}

fn cheque_id(raw: &str) -> ApiResult<ChequeId> {
    raw.parse()
        .map_err(|_| ApiError::not_found(format!("cheque {raw}")))
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/cheques?state=` - List cheques.
async fn list_cheques(
    State(state): State<AppState>,
    _auth: AuthUser,
    ApiQuery(query): ApiQuery<ListChequesQuery>,
) -> ApiResult<Json<Vec<ChequeView>>> {
    let filter = match query.state.as_deref() {
        None => None,
        Some(raw) => Some(ChequeState::parse(raw).ok_or_else(|| {
            ApiError::invalid_field("state", format!("'{raw}' is not a cheque state"))
        })?),
    };
    let cheques = state.repository.list_cheques(filter).await;
    Ok(Json(cheques.into_iter().map(ChequeView::from).collect()))
}

/// GET `/cheques/{id}` - Read one cheque.
async fn get_cheque(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<ChequeView>> {
    let cheque = state.repository.get_cheque(cheque_id(&id)?).await?;
    Ok(Json(cheque.into()))
}

/// POST `/cheques/{id}/transitions` - Cash out, cancel or transfer a cheque.
async fn transition_cheque(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ApiJson(action): ApiJson<ChequeAction>,
) -> ApiResult<Json<ChequeView>> {
    let cheque = state
        .repository
        .transition_cheque(auth.caller(), cheque_id(&id)?, &action)
        .await?;
    Ok(Json(cheque.into()))
}

/// POST `/cheques/cash-out` - Clear several cheques, each on its own.
async fn cash_out_batch(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(payload): ApiJson<CashOutBatchRequest>,
) -> ApiResult<Json<CashOutBatchResponse>> {
    if payload.items.is_empty() {
        return Err(ApiError::invalid_field("items", "must contain at least one cheque"));
    }
    let outcomes = state
        .repository
        .cash_out_batch(auth.caller(), &payload.items)
        .await;

    let results: Vec<CashOutItemResult> = outcomes
        .into_iter()
        .map(|outcome| match outcome.result {
            Ok(cheque) => CashOutItemResult {
                cheque_id: outcome.cheque_id,
                success: true,
                cheque: Some(cheque.into()),
                error: None,
                message: None,
            },
            Err(e) => CashOutItemResult {
                cheque_id: outcome.cheque_id,
                success: false,
                cheque: None,
                error: Some(e.error_code()),
                message: Some(e.to_string()),
            },
        })
        .collect();
    let succeeded = results.iter().filter(|r| r.success).count();
    Ok(Json(CashOutBatchResponse {
        succeeded,
        failed: results.len() - succeeded,
        results,
    }))
}
