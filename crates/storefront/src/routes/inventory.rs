//! Inventory route handlers.
//!
//! `GET /inventory` serves the merged, enriched product list. `POST
//! /inventory` applies one stock mutation per request, using the ad hoc
//! action schema the admin front end sends:
//!
//! ```json
//! {"action": "adjust", "productId": "p1", "delta": -2}
//! {"action": "set", "productId": "p1", "stock": 5, "price": 2.75, "binId": "..."}
//! {"action": "create", "binId": "...", "product": {"id": "p2", ...}}
//! {"action": "delete", "productId": "p1"}
//! ```
//!
//! A bare `{"productId", "delta"}` body (no action) is treated as an adjust,
//! which is the shape the Stripe webhook path uses.

use axum::{
    Json,
    extract::State,
    http::header,
    response::{AppendHeaders, IntoResponse},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use torp_tcg_core::{BinId, Category, ProductId, Stock};

use crate::error::{AppError, Result};
use crate::inventory::{self, SetStockRequest};
use crate::state::AppState;

/// Merged inventory responses must never be cached by the browser: they
/// carry live stock counts.
const NO_STORE: [(header::HeaderName, &str); 1] =
    [(header::CACHE_CONTROL, "no-cache, no-store, must-revalidate")];

/// Stock mutation request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    pub action: Option<String>,
    pub product_id: Option<ProductId>,
    pub delta: Option<i64>,
    pub stock: Option<Stock>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub bin_id: Option<BinId>,
    pub category: Option<Category>,
    #[serde(default)]
    pub pre_order: bool,
    pub product: Option<Value>,
}

/// Serve the enriched inventory.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let products = inventory::merged_inventory(state.bins(), &state.config().bins).await?;
    Ok((AppendHeaders(NO_STORE), Json(products)))
}

/// Apply a stock mutation to the master inventory.
#[instrument(skip(state, request), fields(action = request.action.as_deref().unwrap_or("adjust")))]
pub async fn update(
    State(state): State<AppState>,
    Json(request): Json<UpdateRequest>,
) -> Result<Json<Value>> {
    let bins = state.bins();
    let config = &state.config().bins;

    let action = request.action.clone();
    match (action.as_deref(), request) {
        // Relative adjustment; also the implicit form with no action
        (
            Some("adjust") | None,
            UpdateRequest {
                product_id: Some(product_id),
                delta: Some(delta),
                ..
            },
        ) => {
            inventory::adjust_stock(bins, config, &product_id, delta).await?;
        }

        // Absolute set, optionally updating price and bin routing
        (
            Some("set"),
            UpdateRequest {
                product_id: Some(product_id),
                stock: Some(stock),
                price,
                bin_id,
                category,
                pre_order,
                ..
            },
        ) => {
            inventory::set_stock(
                bins,
                config,
                SetStockRequest {
                    product_id,
                    stock,
                    price,
                    bin_id,
                    category,
                    pre_order,
                },
            )
            .await?;
        }

        // Dual write: detail bin record plus master index row
        (
            Some("create"),
            UpdateRequest {
                product: Some(product),
                bin_id: Some(bin_id),
                ..
            },
        ) => {
            inventory::create_product(bins, config, product, bin_id).await?;
        }

        // Remove the index row; the detail record is kept
        (
            Some("delete"),
            UpdateRequest {
                product_id: Some(product_id),
                ..
            },
        ) => {
            inventory::delete_product(bins, config, &product_id).await?;
        }

        _ => return Err(AppError::BadRequest("Invalid action".to_owned())),
    }

    Ok(Json(json!({ "success": true, "message": "Stock updated" })))
}

/// Reroute dual-domain cards to the dual bin.
#[instrument(skip(state))]
pub async fn repair_dual(State(state): State<AppState>) -> Result<Json<Value>> {
    let report =
        inventory::repair_dual_routing(state.bins(), &state.config().bins).await?;

    let message = if report.updated_count == 0 {
        "No dual-domain cards found in master inventory that need updating".to_owned()
    } else {
        format!(
            "Successfully updated {} dual-domain cards",
            report.updated_count
        )
    };

    let mut body = serde_json::to_value(&report)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if let Some(map) = body.as_object_mut() {
        map.insert("success".to_owned(), json!(true));
        map.insert("message".to_owned(), json!(message));
    }

    Ok(Json(body))
}
