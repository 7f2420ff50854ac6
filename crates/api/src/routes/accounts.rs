//! Account, mutation and ledger routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use khata_core::account::{Account, AccountKind, AccountRef, OpenAccountRequest};
use khata_core::ledger::{LedgerView, LegacyImportRow};
use khata_core::mutation::MutationRequest;
use khata_shared::types::TransactionId;
use serde::Deserialize;

use crate::{
    AppState,
    error::{ApiError, ApiJson, ApiQuery, ApiResult},
    middleware::AuthUser,
    routes::proofs,
};

/// Creates the account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", post(create_account).get(list_accounts))
        .route("/accounts/{kind}/{id}", get(get_account))
        .route("/accounts/{kind}/{id}/mutations", post(apply_mutation))
        .route("/accounts/{kind}/{id}/ledger", get(list_ledger))
        .route("/accounts/{kind}/{id}/legacy-imports", post(import_legacy))
        .route("/transactions/{id}", delete(delete_transaction))
}

// ============================================================================
// Request Types
// ============================================================================

/// Query parameters for listing accounts.
#[derive(Debug, Deserialize)]
pub struct ListAccountsQuery {
    /// Restrict to one kind.
    pub kind: Option<String>,
}

/// Request body for a legacy import.
#[derive(Debug, Deserialize)]
pub struct LegacyImportBody {
    /// Rows from the old books.
    pub rows: Vec<LegacyImportRow>,
}

/// Resolves `/{kind}/{id}` to an account reference.
///
/// Anything that cannot name an account is reported as not found.
fn account_ref(kind: &str, id: &str) -> ApiResult<AccountRef> {
    AccountKind::parse(kind)
        .and_then(|kind| AccountRef::from_parts(kind, id))
        .ok_or_else(|| ApiError::not_found(format!("account {kind}/{id}")))
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/accounts` - Open a customer, supplier, shipper or bank account.
async fn create_account(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(payload): ApiJson<OpenAccountRequest>,
) -> ApiResult<(StatusCode, Json<Account>)> {
    let account = state
        .repository
        .create_account(auth.caller(), &payload)
        .await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// GET `/accounts?kind=` - List accounts.
async fn list_accounts(
    State(state): State<AppState>,
    _auth: AuthUser,
    ApiQuery(query): ApiQuery<ListAccountsQuery>,
) -> ApiResult<Json<Vec<Account>>> {
    let kind = match query.kind.as_deref() {
        None => None,
        Some(raw) => Some(AccountKind::parse(raw).ok_or_else(|| {
            ApiError::invalid_field(
                "kind",
                format!("'{raw}' is not one of customer, supplier, shipper, bank, cash"),
            )
        })?),
    };
    Ok(Json(state.repository.list_accounts(kind).await))
}

/// GET `/accounts/{kind}/{id}` - Read one account.
async fn get_account(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<Json<Account>> {
    let reference = account_ref(&kind, &id)?;
    Ok(Json(state.repository.get_account(reference).await?))
}

/// POST `/accounts/{kind}/{id}/mutations` - Apply a balance mutation.
async fn apply_mutation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((kind, id)): Path<(String, String)>,
    ApiJson(payload): ApiJson<MutationRequest>,
) -> ApiResult<Json<Account>> {
    let reference = account_ref(&kind, &id)?;
    proofs::ensure_uploaded(&state, &auth, payload.proof_image.as_deref()).await?;
    let account = state
        .repository
        .apply_mutation(auth.caller(), reference, &payload)
        .await?;
    Ok(Json(account))
}

/// GET `/accounts/{kind}/{id}/ledger` - Ledger with running balance.
async fn list_ledger(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<Json<LedgerView>> {
    let reference = account_ref(&kind, &id)?;
    Ok(Json(state.repository.list_ledger(reference).await?))
}

/// POST `/accounts/{kind}/{id}/legacy-imports` - Append rows from the old books.
async fn import_legacy(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((kind, id)): Path<(String, String)>,
    ApiJson(payload): ApiJson<LegacyImportBody>,
) -> ApiResult<(StatusCode, Json<Account>)> {
    let reference = account_ref(&kind, &id)?;
    let account = state
        .repository
        .import_legacy(auth.caller(), reference, &payload.rows)
        .await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// DELETE `/transactions/{id}` - Hard-delete the operation a transaction belongs to.
async fn delete_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let transaction_id: TransactionId = id
        .parse()
        .map_err(|_| ApiError::not_found(format!("transaction {id}")))?;
    state
        .repository
        .delete_transaction(auth.caller(), transaction_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
