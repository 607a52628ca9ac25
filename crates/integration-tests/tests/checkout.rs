//! Integration tests for checkout session creation.
//!
//! The service must validate the basket against live inventory and price
//! every line server-side before talking to Stripe.

use std::collections::HashMap;

use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use torp_tcg_integration_tests::{MASTER_BIN, master_doc, mock_bin, spawn_app, test_config};

/// Mount a successful checkout-session mock on the Stripe server.
async fn mock_stripe_session(stripe: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_123",
            "url": "https://checkout.stripe.com/pay/cs_test_123"
        })))
        .mount(stripe)
        .await;
}

/// Parse the form-encoded body of the one request Stripe received.
async fn stripe_form(stripe: &MockServer) -> HashMap<String, String> {
    let requests = stripe
        .received_requests()
        .await
        .expect("request recording enabled");
    let request = requests
        .iter()
        .find(|r| r.url.path() == "/v1/checkout/sessions")
        .expect("checkout session request");
    url::form_urlencoded::parse(&request.body)
        .into_owned()
        .collect()
}

async fn post_checkout(base_url: &str, cart: Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{base_url}/create-checkout-session"))
        .json(&json!({ "cart": cart }))
        .send()
        .await
        .expect("request")
}

/// Seed a one-product store: £89.99 box with 3 in stock.
async fn seed_store(store: &MockServer) {
    mock_bin(
        store,
        MASTER_BIN,
        master_doc(json!([
            {"productId": "sealed-001", "binId": "bin-p", "category": "sealed", "stock": 3}
        ])),
    )
    .await;
    mock_bin(
        store,
        "bin-p",
        json!([{"id": "sealed-001", "title": "Booster Box", "price": 89.99, "image": "https://cdn/box.png"}]),
    )
    .await;
}

#[tokio::test]
async fn checkout_creates_session_with_server_prices() {
    let store = MockServer::start().await;
    let stripe = MockServer::start().await;
    seed_store(&store).await;
    mock_stripe_session(&stripe).await;

    let base_url = spawn_app(test_config(&store.uri(), &stripe.uri())).await;
    let response = post_checkout(
        &base_url,
        // The client claims the box costs a penny; the server must ignore that
        json!([{"id": "sealed-001", "title": "Booster Box", "price": 0.01, "quantity": 2}]),
    )
    .await;

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await.expect("JSON");
    assert_eq!(body["url"], "https://checkout.stripe.com/pay/cs_test_123");

    let form = stripe_form(&stripe).await;
    assert_eq!(form.get("mode").map(String::as_str), Some("payment"));
    assert_eq!(
        form.get("line_items[0][price_data][currency]").map(String::as_str),
        Some("gbp")
    );
    // Server-side price in pence, not the client's
    assert_eq!(
        form.get("line_items[0][price_data][unit_amount]").map(String::as_str),
        Some("8999")
    );
    assert_eq!(form.get("line_items[0][quantity]").map(String::as_str), Some("2"));
    assert_eq!(
        form.get("metadata[cart_items]").map(String::as_str),
        Some(r#"[{"id":"sealed-001","q":2}]"#)
    );
    assert_eq!(
        form.get("success_url").map(String::as_str),
        Some("https://shop.example/success.html")
    );
}

#[tokio::test]
async fn empty_cart_is_rejected() {
    let store = MockServer::start().await;
    let stripe = MockServer::start().await;
    seed_store(&store).await;

    let base_url = spawn_app(test_config(&store.uri(), &stripe.uri())).await;
    let response = post_checkout(&base_url, json!([])).await;

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("JSON");
    assert_eq!(body["error"], "Cart is empty");
}

#[tokio::test]
async fn unknown_product_is_rejected() {
    let store = MockServer::start().await;
    let stripe = MockServer::start().await;
    seed_store(&store).await;

    let base_url = spawn_app(test_config(&store.uri(), &stripe.uri())).await;
    let response = post_checkout(
        &base_url,
        json!([{"id": "ghost", "title": "Ghost Item", "price": 1.0, "quantity": 1}]),
    )
    .await;

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("JSON");
    assert_eq!(body["error"], "Product Ghost Item not found");
}

#[tokio::test]
async fn insufficient_stock_is_rejected() {
    let store = MockServer::start().await;
    let stripe = MockServer::start().await;
    seed_store(&store).await;

    let base_url = spawn_app(test_config(&store.uri(), &stripe.uri())).await;
    let response = post_checkout(
        &base_url,
        json!([{"id": "sealed-001", "title": "Booster Box", "price": 89.99, "quantity": 4}]),
    )
    .await;

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("JSON");
    assert_eq!(body["error"], "Insufficient stock for Booster Box");
    // Stripe was never called
    assert!(stripe
        .received_requests()
        .await
        .expect("recording")
        .is_empty());
}

#[tokio::test]
async fn stripe_failure_maps_to_bad_gateway() {
    let store = MockServer::start().await;
    let stripe = MockServer::start().await;
    seed_store(&store).await;

    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .respond_with(ResponseTemplate::new(402).set_body_string("card error"))
        .mount(&stripe)
        .await;

    let base_url = spawn_app(test_config(&store.uri(), &stripe.uri())).await;
    let response = post_checkout(
        &base_url,
        json!([{"id": "sealed-001", "title": "Booster Box", "price": 89.99, "quantity": 1}]),
    )
    .await;

    assert_eq!(response.status(), reqwest::StatusCode::BAD_GATEWAY);
}
