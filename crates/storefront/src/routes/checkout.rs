//! Checkout session route handler.
//!
//! The browser posts its basket; the server re-derives every price and stock
//! count from the merged inventory before asking Stripe for a session, so a
//! tampered client payload can neither change prices nor oversell.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, instrument};

use torp_tcg_core::Basket;

use crate::error::{AppError, Result};
use crate::inventory;
use crate::services::checkout::{build_line_items, cart_metadata};
use crate::services::stripe::CheckoutSessionParams;
use crate::state::AppState;

/// Checkout request body: the client basket as stored in the browser.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub cart: Basket,
}

/// Validate the basket and create a Stripe Checkout Session.
///
/// Returns `{"url": ...}` for the browser to redirect to.
#[instrument(skip(state, request), fields(lines = request.cart.len()))]
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<Value>> {
    if request.cart.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".to_owned()));
    }

    // Re-derive stock and price from the store before trusting any line
    let products = inventory::merged_inventory(state.bins(), &state.config().bins).await?;

    let line_items = build_line_items(&request.cart, &products)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let base_url = state.config().base_url.trim_end_matches('/').to_owned();
    let params = CheckoutSessionParams {
        line_items,
        success_url: format!("{base_url}/success.html"),
        cancel_url: format!("{base_url}/cancel.html"),
        cart_metadata: cart_metadata(&request.cart),
    };

    let session = state.stripe().create_checkout_session(&params).await?;
    info!(session = %session.id, "Created checkout session");

    Ok(Json(json!({ "url": session.url })))
}
