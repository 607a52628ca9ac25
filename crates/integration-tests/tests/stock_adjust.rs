//! Integration tests for stock adjustment.
//!
//! `POST /inventory` runs a read-modify-write cycle against the master bin;
//! these tests assert on the exact documents the service PUTs back.

use serde_json::json;
use wiremock::MockServer;

use torp_tcg_integration_tests::{
    MASTER_BIN, master_doc, mock_bin, mock_bin_write, put_bodies, spawn_app, test_config,
};

async fn post_inventory(base_url: &str, body: serde_json::Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{base_url}/inventory"))
        .json(&body)
        .send()
        .await
        .expect("request")
}

#[tokio::test]
async fn adjust_applies_delta_and_writes_back() {
    let store = MockServer::start().await;
    let stripe = MockServer::start().await;

    mock_bin(
        &store,
        MASTER_BIN,
        master_doc(json!([
            {"productId": "p1", "binId": "bin-x", "category": "singles", "stock": 5},
            {"productId": "p2", "binId": "bin-x", "category": "singles", "stock": 2}
        ])),
    )
    .await;
    mock_bin_write(&store, MASTER_BIN).await;

    let base_url = spawn_app(test_config(&store.uri(), &stripe.uri())).await;
    let response = post_inventory(
        &base_url,
        json!({"action": "adjust", "productId": "p1", "delta": -2}),
    )
    .await;

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("JSON");
    assert_eq!(body["success"], true);

    let writes = put_bodies(&store, MASTER_BIN).await;
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0]["inventory"][0]["stock"], 3);
    // Untouched rows ride along in the whole-document write
    assert_eq!(writes[0]["inventory"][1]["stock"], 2);
}

#[tokio::test]
async fn adjust_clamps_stock_at_zero() {
    let store = MockServer::start().await;
    let stripe = MockServer::start().await;

    mock_bin(
        &store,
        MASTER_BIN,
        master_doc(json!([
            {"productId": "p1", "binId": "bin-x", "category": "singles", "stock": 1}
        ])),
    )
    .await;
    mock_bin_write(&store, MASTER_BIN).await;

    let base_url = spawn_app(test_config(&store.uri(), &stripe.uri())).await;
    post_inventory(
        &base_url,
        json!({"action": "adjust", "productId": "p1", "delta": -10}),
    )
    .await;

    let writes = put_bodies(&store, MASTER_BIN).await;
    // Clamped at zero, and the row stays in the index
    assert_eq!(writes[0]["inventory"][0]["stock"], 0);
}

#[tokio::test]
async fn implicit_delta_without_action_is_an_adjust() {
    let store = MockServer::start().await;
    let stripe = MockServer::start().await;

    mock_bin(
        &store,
        MASTER_BIN,
        master_doc(json!([
            {"productId": "p1", "binId": "bin-x", "category": "singles", "stock": 5}
        ])),
    )
    .await;
    mock_bin_write(&store, MASTER_BIN).await;

    let base_url = spawn_app(test_config(&store.uri(), &stripe.uri())).await;
    let response = post_inventory(&base_url, json!({"productId": "p1", "delta": -1})).await;

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let writes = put_bodies(&store, MASTER_BIN).await;
    assert_eq!(writes[0]["inventory"][0]["stock"], 4);
}

#[tokio::test]
async fn adjust_unknown_product_is_not_found() {
    let store = MockServer::start().await;
    let stripe = MockServer::start().await;

    mock_bin(&store, MASTER_BIN, master_doc(json!([]))).await;
    mock_bin_write(&store, MASTER_BIN).await;

    let base_url = spawn_app(test_config(&store.uri(), &stripe.uri())).await;
    let response = post_inventory(
        &base_url,
        json!({"action": "adjust", "productId": "ghost", "delta": -1}),
    )
    .await;

    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json().await.expect("JSON");
    assert_eq!(body["error"], "Product not found");
    // Nothing was written
    assert!(put_bodies(&store, MASTER_BIN).await.is_empty());
}

#[tokio::test]
async fn set_updates_stock_price_and_routing() {
    let store = MockServer::start().await;
    let stripe = MockServer::start().await;

    mock_bin(
        &store,
        MASTER_BIN,
        master_doc(json!([
            {"productId": "p1", "binId": "bin-calm", "category": "singles", "stock": 2}
        ])),
    )
    .await;
    mock_bin_write(&store, MASTER_BIN).await;

    let base_url = spawn_app(test_config(&store.uri(), &stripe.uri())).await;
    let response = post_inventory(
        &base_url,
        json!({"action": "set", "productId": "p1", "stock": 7, "price": 1.25, "binId": "bin-dual"}),
    )
    .await;

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let writes = put_bodies(&store, MASTER_BIN).await;
    let row = &writes[0]["inventory"][0];
    assert_eq!(row["stock"], 7);
    assert_eq!(row["price"], 1.25);
    assert_eq!(row["binId"], "bin-dual");
}

#[tokio::test]
async fn set_to_zero_removes_the_row() {
    let store = MockServer::start().await;
    let stripe = MockServer::start().await;

    mock_bin(
        &store,
        MASTER_BIN,
        master_doc(json!([
            {"productId": "p1", "binId": "bin-x", "category": "singles", "stock": 2},
            {"productId": "p2", "binId": "bin-x", "category": "singles", "stock": 9}
        ])),
    )
    .await;
    mock_bin_write(&store, MASTER_BIN).await;

    let base_url = spawn_app(test_config(&store.uri(), &stripe.uri())).await;
    post_inventory(&base_url, json!({"action": "set", "productId": "p1", "stock": 0})).await;

    let writes = put_bodies(&store, MASTER_BIN).await;
    let inventory = writes[0]["inventory"].as_array().expect("array");
    assert_eq!(inventory.len(), 1);
    assert_eq!(inventory[0]["productId"], "p2");
}

#[tokio::test]
async fn set_new_product_requires_routing() {
    let store = MockServer::start().await;
    let stripe = MockServer::start().await;

    mock_bin(&store, MASTER_BIN, master_doc(json!([]))).await;
    mock_bin_write(&store, MASTER_BIN).await;

    let base_url = spawn_app(test_config(&store.uri(), &stripe.uri())).await;
    let response = post_inventory(
        &base_url,
        json!({"action": "set", "productId": "new", "stock": 3}),
    )
    .await;

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.expect("JSON");
    assert_eq!(body["error"], "binId and category required for new items");
}

#[tokio::test]
async fn set_new_product_inserts_with_routing() {
    let store = MockServer::start().await;
    let stripe = MockServer::start().await;

    mock_bin(&store, MASTER_BIN, master_doc(json!([]))).await;
    mock_bin_write(&store, MASTER_BIN).await;

    let base_url = spawn_app(test_config(&store.uri(), &stripe.uri())).await;
    let response = post_inventory(
        &base_url,
        json!({"action": "set", "productId": "new", "stock": 3, "binId": "bin-calm", "category": "singles"}),
    )
    .await;

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let writes = put_bodies(&store, MASTER_BIN).await;
    let row = &writes[0]["inventory"][0];
    assert_eq!(row["productId"], "new");
    assert_eq!(row["stock"], 3);
    // Singles default price applies when none is supplied
    assert_eq!(row["price"], 0.5);
}

#[tokio::test]
async fn create_writes_detail_bin_then_master_index() {
    let store = MockServer::start().await;
    let stripe = MockServer::start().await;

    mock_bin(&store, MASTER_BIN, master_doc(json!([]))).await;
    mock_bin_write(&store, MASTER_BIN).await;
    mock_bin(
        &store,
        "bin-products-2",
        json!({"products": [{"id": "existing"}]}),
    )
    .await;
    mock_bin_write(&store, "bin-products-2").await;

    let base_url = spawn_app(test_config(&store.uri(), &stripe.uri())).await;
    let response = post_inventory(
        &base_url,
        json!({
            "action": "create",
            "binId": "bin-products-2",
            "product": {"id": "sealed-002", "title": "Elite Trainer Box", "category": "sealed", "stock": 6}
        }),
    )
    .await;

    assert_eq!(response.status(), reqwest::StatusCode::OK);

    // Detail bin keeps its wrapped shape and gains the record
    let detail_writes = put_bodies(&store, "bin-products-2").await;
    assert_eq!(detail_writes.len(), 1);
    let products = detail_writes[0]["products"].as_array().expect("array");
    assert_eq!(products.len(), 2);
    assert_eq!(products[1]["id"], "sealed-002");

    // Master index gains the routing row
    let master_writes = put_bodies(&store, MASTER_BIN).await;
    let row = &master_writes[0]["inventory"][0];
    assert_eq!(row["productId"], "sealed-002");
    assert_eq!(row["binId"], "bin-products-2");
    assert_eq!(row["category"], "sealed");
    assert_eq!(row["stock"], 6);
}

#[tokio::test]
async fn delete_removes_only_the_index_row() {
    let store = MockServer::start().await;
    let stripe = MockServer::start().await;

    mock_bin(
        &store,
        MASTER_BIN,
        master_doc(json!([
            {"productId": "p1", "binId": "bin-x", "category": "singles", "stock": 2}
        ])),
    )
    .await;
    mock_bin_write(&store, MASTER_BIN).await;

    let base_url = spawn_app(test_config(&store.uri(), &stripe.uri())).await;
    let response =
        post_inventory(&base_url, json!({"action": "delete", "productId": "p1"})).await;

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let writes = put_bodies(&store, MASTER_BIN).await;
    assert_eq!(writes[0]["inventory"], json!([]));
    // No write to any detail bin happened
    assert!(put_bodies(&store, "bin-x").await.is_empty());
}

#[tokio::test]
async fn invalid_action_is_rejected() {
    let store = MockServer::start().await;
    let stripe = MockServer::start().await;

    let base_url = spawn_app(test_config(&store.uri(), &stripe.uri())).await;
    let response = post_inventory(&base_url, json!({"action": "explode"})).await;

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
}
