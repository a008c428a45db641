/// API server for doc-ledger.
///
/// The server is a thin routing layer over the anchor service:
/// - Anchors document content hashes into the integrity ledger
/// - Answers proof-of-existence queries per document
/// - Reports whole-chain integrity
/// - Hands out content hashes for external notarization
pub mod auth;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::anchor::AnchorService;

/// Shared application state available to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub anchor: AnchorService,
    /// JWT signing secret.
    pub jwt_secret: String,
}

/// Build the Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::health_routes())
        .merge(routes::proof_routes())
        .with_state(Arc::new(state))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Start the API server and run until Ctrl-C.
pub async fn serve(state: AppState, addr: &str) -> crate::error::Result<()> {
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(crate::error::LedgerError::Io)?;

    tracing::info!("doc-ledger API server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(crate::error::LedgerError::Io)?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
