/// REST API routes for doc-ledger.
///
/// Every `/api/proof` route runs under an authenticated session; the
/// principal is logged on anchoring, the only mutating call.
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::auth::{api_error, ApiError};
use super::middleware::AuthUser;
use super::AppState;
use crate::anchor::ProofSet;
use crate::error::LedgerError;
use crate::ledger::{Block, ChainReport};

// ─── Health ──────────────────────────────────────────────

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn health_routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}

// ─── Proofs ──────────────────────────────────────────────

/// Request to anchor a document.
#[derive(Debug, Deserialize)]
struct AnchorRequest {
    #[serde(default)]
    document_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct AnchorResponse {
    block: Block,
}

#[derive(Debug, Serialize)]
struct HashResponse {
    document_id: String,
    sha256: String,
}

/// POST /api/proof/anchor — Record a document's content hash.
async fn anchor_document(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    body: Result<Json<AnchorRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AnchorResponse>), ApiError> {
    let Json(req) = body.map_err(|e| api_error(LedgerError::Validation(e.body_text())))?;
    let document_id = req
        .document_id
        .ok_or_else(|| api_error(LedgerError::Validation("document_id is required".into())))?;

    info!(user = %user.user_id, document_id = %document_id, "Anchor requested");

    let block = state.anchor.anchor(&document_id).await.map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(AnchorResponse { block })))
}

/// GET /api/proof/verify/{document_id} — Anchoring history for a document.
async fn verify_document(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<String>,
) -> Result<Json<ProofSet>, ApiError> {
    let proofs = state
        .anchor
        .proofs_for(&document_id)
        .await
        .map_err(api_error)?;
    Ok(Json(proofs))
}

/// GET /api/proof/chain — Whole-chain integrity.
async fn chain_status(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ChainReport>, ApiError> {
    let report = state.anchor.chain_status().await.map_err(api_error)?;
    Ok(Json(report))
}

/// GET /api/proof/hash/{document_id} — Content hash for external anchoring.
async fn document_hash(
    _user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(document_id): Path<String>,
) -> Result<Json<HashResponse>, ApiError> {
    let sha256 = state.anchor.hash_of(&document_id).await.map_err(api_error)?;
    Ok(Json(HashResponse {
        document_id,
        sha256,
    }))
}

pub fn proof_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/proof/anchor", post(anchor_document))
        .route("/api/proof/verify/{document_id}", get(verify_document))
        .route("/api/proof/chain", get(chain_status))
        .route("/api/proof/hash/{document_id}", get(document_hash))
}
