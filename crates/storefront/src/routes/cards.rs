//! Card gallery route handler.

use axum::{
    Json,
    extract::State,
    http::header,
    response::{AppendHeaders, IntoResponse},
};
use tracing::instrument;

use crate::catalog;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// The gallery changes rarely; let browsers and CDNs hold it for an hour.
const PUBLIC_HOUR: [(header::HeaderName, &str); 1] =
    [(header::CACHE_CONTROL, "public, max-age=3600")];

/// Serve the aggregated card gallery.
///
/// Individual bin failures are tolerated; only a gallery with no cards at
/// all is treated as an outage.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let gallery = catalog::load_gallery(state.bins(), &state.config().bins).await;

    if gallery.is_empty() {
        return Err(AppError::Unavailable("No card data available".to_owned()));
    }

    Ok((AppendHeaders(PUBLIC_HOUR), Json(gallery)))
}
