//! Server-side basket validation for checkout.
//!
//! The client's basket is untrusted: before a session is created, every line
//! is re-derived from the merged inventory - prices always come from the
//! server, and stock must cover the requested quantity.

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use torp_tcg_core::{Basket, Price};

use super::stripe::LineItem;

/// Stripe metadata values are capped at 500 characters; the cart snapshot is
/// truncated to fit.
const METADATA_LIMIT: usize = 500;

/// Reasons a basket fails validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Product {0} not found")]
    ProductNotFound(String),

    #[error("Insufficient stock for {0}")]
    InsufficientStock(String),
}

/// A compact cart line stored in session metadata for the webhook.
#[derive(Debug, Serialize)]
struct CartRef<'a> {
    id: &'a str,
    q: u32,
}

/// Validate the basket against the merged inventory and build priced line
/// items.
///
/// # Errors
///
/// - [`CheckoutError::EmptyCart`] for an empty basket
/// - [`CheckoutError::ProductNotFound`] when a line's product is not in the
///   merged inventory
/// - [`CheckoutError::InsufficientStock`] when stock does not cover the
///   requested quantity
pub fn build_line_items(basket: &Basket, products: &[Value]) -> Result<Vec<LineItem>, CheckoutError> {
    if basket.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    basket
        .iter()
        .map(|entry| {
            let product = products
                .iter()
                .find(|p| {
                    let wanted = entry.id.as_str();
                    p.get("id").and_then(Value::as_str) == Some(wanted)
                        || p.get("publicCode").and_then(Value::as_str) == Some(wanted)
                })
                .ok_or_else(|| CheckoutError::ProductNotFound(entry.title.clone()))?;

            let title = product
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or(entry.title.as_str());

            let stock = product.get("stock").and_then(Value::as_u64).unwrap_or(0);
            if stock < u64::from(entry.quantity) {
                return Err(CheckoutError::InsufficientStock(title.to_owned()));
            }

            // Always use the server-side price, never the client's
            let amount = product
                .get("price")
                .and_then(Value::as_f64)
                .and_then(Decimal::from_f64)
                .unwrap_or(Decimal::ZERO);

            let image = product
                .get("image")
                .and_then(Value::as_str)
                .filter(|url| !url.is_empty())
                .map(str::to_owned);

            Ok(LineItem {
                name: title.to_owned(),
                image,
                product_id: entry.id.clone(),
                unit_amount: Price::gbp(amount).minor_units(),
                quantity: entry.quantity,
            })
        })
        .collect()
}

/// Serialize the basket as the compact `[{id, q}]` snapshot, truncated to
/// the metadata limit.
#[must_use]
pub fn cart_metadata(basket: &Basket) -> String {
    let refs: Vec<CartRef<'_>> = basket
        .iter()
        .map(|entry| CartRef {
            id: entry.id.as_str(),
            q: entry.quantity,
        })
        .collect();

    let json = serde_json::to_string(&refs).unwrap_or_else(|_| "[]".to_owned());
    json.chars().take(METADATA_LIMIT).collect()
}
