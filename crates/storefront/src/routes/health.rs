//! Health check handlers.

use axum::extract::State;
use axum::http::StatusCode;

use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn liveness() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies the document store is reachable by reading the master inventory
/// bin (served from cache when fresh). Returns 503 Service Unavailable if
/// the store is not reachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    let master_bin = &state.config().bins.master_inventory_bin;
    match state.bins().read(master_bin).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
