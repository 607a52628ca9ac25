//! Stripe webhook route handler.
//!
//! Stripe delivers events as JSON. Only `checkout.session.completed` changes
//! state here: each line recorded in the session's `cart_items` metadata has
//! its stock decremented through the same adjustment path the admin uses,
//! so the never-negative clamp applies to webhook traffic too.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, instrument, warn};

use torp_tcg_core::ProductId;

use crate::error::Result;
use crate::inventory;
use crate::state::AppState;

/// A Stripe event envelope. Only the fields this handler reads are modeled;
/// the session object keeps its raw shape.
#[derive(Debug, Deserialize)]
pub struct StripeEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: StripeEventData,
}

#[derive(Debug, Deserialize)]
pub struct StripeEventData {
    pub object: Value,
}

/// A compact cart line from session metadata: `{"id": "p1", "q": 2}`.
#[derive(Debug, Deserialize)]
struct CartRef {
    id: ProductId,
    q: u32,
}

/// Handle a Stripe webhook event.
///
/// Unhandled event types are acknowledged without action so Stripe stops
/// retrying them.
#[instrument(skip(state, event), fields(event_type = %event.event_type))]
pub async fn stripe(
    State(state): State<AppState>,
    Json(event): Json<StripeEvent>,
) -> Result<Json<Value>> {
    match event.event_type.as_str() {
        "checkout.session.completed" => {
            handle_checkout_completed(&state, &event.data.object).await;
        }
        "payment_intent.succeeded" => {
            let intent = event.data.object.get("id").and_then(Value::as_str);
            info!(intent = intent.unwrap_or("unknown"), "Payment succeeded");
        }
        other => {
            info!(event_type = other, "Unhandled event type");
        }
    }

    Ok(Json(json!({ "received": true })))
}

/// Decrement stock for every line of a completed checkout.
///
/// Failures are logged per line rather than surfaced: Stripe has already
/// taken payment, and a non-2xx response would only make it re-deliver an
/// event whose stock movement may have partially applied.
async fn handle_checkout_completed(state: &AppState, session: &Value) {
    let session_id = session.get("id").and_then(Value::as_str).unwrap_or("unknown");
    info!(session = session_id, "Checkout completed");

    for (product_id, quantity) in purchased_lines(session) {
        let delta = -i64::from(quantity);
        match inventory::adjust_stock(state.bins(), &state.config().bins, &product_id, delta).await
        {
            Ok(stock) => {
                info!(product = %product_id, quantity, remaining = %stock, "Decremented stock");
            }
            Err(err) => {
                warn!(product = %product_id, error = %err, "Failed to update stock");
            }
        }
    }
}

/// Extract the purchased lines from a session's metadata.
///
/// The multi-item `cart_items` snapshot is preferred; sessions created by
/// the old single-item flow carry `productId`/`quantity` instead.
fn purchased_lines(session: &Value) -> Vec<(ProductId, u32)> {
    let metadata = session.get("metadata");

    if let Some(cart_items) = metadata
        .and_then(|m| m.get("cart_items"))
        .and_then(Value::as_str)
    {
        match serde_json::from_str::<Vec<CartRef>>(cart_items) {
            Ok(refs) => return refs.into_iter().map(|r| (r.id, r.q)).collect(),
            Err(err) => {
                warn!(error = %err, "Failed to parse cart_items metadata");
            }
        }
    }

    // Legacy single-item sessions
    if let Some(product_id) = metadata
        .and_then(|m| m.get("productId"))
        .and_then(Value::as_str)
    {
        let quantity = metadata
            .and_then(|m| m.get("quantity"))
            .and_then(Value::as_str)
            .and_then(|q| q.parse().ok())
            .unwrap_or(1);
        return vec![(ProductId::new(product_id), quantity)];
    }

    warn!("No product ID or cart_items in session metadata");
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_purchased_lines_from_cart_items() {
        let session = json!({
            "id": "cs_test_123",
            "metadata": {"cart_items": r#"[{"id":"p1","q":2},{"id":"p2","q":1}]"#}
        });

        let lines = purchased_lines(&session);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], (ProductId::new("p1"), 2));
        assert_eq!(lines[1], (ProductId::new("p2"), 1));
    }

    #[test]
    fn test_purchased_lines_legacy_single_item() {
        let session = json!({
            "metadata": {"productId": "p1", "quantity": "3"}
        });

        let lines = purchased_lines(&session);
        assert_eq!(lines, vec![(ProductId::new("p1"), 3)]);
    }

    #[test]
    fn test_purchased_lines_legacy_defaults_to_one() {
        let session = json!({"metadata": {"productId": "p1"}});
        assert_eq!(purchased_lines(&session), vec![(ProductId::new("p1"), 1)]);
    }

    #[test]
    fn test_purchased_lines_empty_metadata() {
        assert!(purchased_lines(&json!({"metadata": {}})).is_empty());
        assert!(purchased_lines(&json!({})).is_empty());
    }

    #[test]
    fn test_malformed_cart_items_falls_back_to_single_item() {
        let session = json!({
            "metadata": {"cart_items": "{not json", "productId": "p1"}
        });
        assert_eq!(purchased_lines(&session), vec![(ProductId::new("p1"), 1)]);
    }
}
