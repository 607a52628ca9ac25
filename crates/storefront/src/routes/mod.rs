//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                   - Liveness check
//! GET  /health/ready             - Readiness check (probes the document store)
//!
//! # Inventory
//! GET  /inventory                - Enriched inventory (master index merged with detail bins)
//! POST /inventory                - Stock adjustment (adjust/set/create/delete)
//! POST /inventory/repair-dual    - Reroute dual-domain cards to the dual bin
//!
//! # Products
//! GET  /products                 - Sealed products/accessories/prints
//! POST /products                 - Product CRUD (add/update/delete)
//!
//! # Cards
//! GET  /cards                    - Card gallery aggregated across domain bins
//!
//! # Checkout
//! POST /create-checkout-session  - Validate basket, create Stripe session
//! POST /webhooks/stripe          - Stripe events (checkout.session.completed)
//! ```

pub mod cards;
pub mod checkout;
pub mod health;
pub mod inventory;
pub mod products;
pub mod webhooks;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the inventory routes router.
pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(inventory::index).post(inventory::update))
        .route("/repair-dual", post(inventory::repair_dual))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Health
        .route("/health", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        // Inventory
        .nest("/inventory", inventory_routes())
        // Products
        .route("/products", get(products::index).post(products::update))
        // Cards
        .route("/cards", get(cards::index))
        // Checkout
        .route("/create-checkout-session", post(checkout::create_session))
        .route("/webhooks/stripe", post(webhooks::stripe))
}
