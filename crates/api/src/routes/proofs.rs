//! Proof-of-payment upload route.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
};
use chrono::Utc;
use khata_core::storage::StoredProof;
use khata_shared::AppError;
use tracing::{info, warn};

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::AuthUser,
};

/// Multipart overhead allowed on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Creates the proof upload route, accepting bodies up to `max_file_size`.
pub fn routes(max_file_size: u64) -> Router<AppState> {
    let limit = usize::try_from(max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);
    Router::new()
        .route("/proofs", post(upload_proof))
        .layer(DefaultBodyLimit::max(limit))
}

/// POST `/proofs` - Store a proof image from the multipart field `file`.
///
/// The returned `key` is what mutations and trade records take as `proofImage`.
async fn upload_proof(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<StoredProof>)> {
    if !auth.role().can_write() {
        return Err(AppError::Forbidden(format!("Role '{}' may not upload proofs", auth.role())).into());
    }

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::invalid_field("file", e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::invalid_field("file", e.body_text()))?;

        let stored = state
            .storage
            .upload_proof(&filename, &content_type, bytes.to_vec(), Utc::now())
            .await?;
        info!(
            user_id = %auth.user_id(),
            key = %stored.key,
            size = stored.size,
            content_type = %stored.content_type,
            "proof uploaded"
        );
        return Ok((StatusCode::CREATED, Json(stored)));
    }

    Err(ApiError::invalid_field("file", "multipart field 'file' is required"))
}

/// Rejects a `proofImage` key that was never uploaded.
///
/// Blank keys and callers without write access fall through to the ledger,
/// which reports those itself.
pub(crate) async fn ensure_uploaded(
    state: &AppState,
    auth: &AuthUser,
    key: Option<&str>,
) -> ApiResult<()> {
    let Some(key) = key.map(str::trim).filter(|k| !k.is_empty()) else {
        return Ok(());
    };
    if !auth.role().can_write() || state.storage.exists(key).await? {
        return Ok(());
    }
    warn!(user_id = %auth.user_id(), key = %key, "proof key not found in storage");
    Err(ApiError::invalid_field(
        "proofImage",
        format!("no uploaded proof at '{key}'"),
    ))
}
