//! Integration tests for product CRUD.
//!
//! Product writes go to the products bin and are mirrored into the master
//! inventory index best-effort.

use serde_json::{Value, json};
use wiremock::MockServer;

use torp_tcg_integration_tests::{
    MASTER_BIN, PRODUCTS_BIN, master_doc, mock_bin, mock_bin_failure, mock_stateful_bin,
    spawn_app, test_config,
};

async fn post_products(base_url: &str, body: Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{base_url}/products"))
        .json(&body)
        .send()
        .await
        .expect("request")
}

#[tokio::test]
async fn get_products_serves_the_bin() {
    let store = MockServer::start().await;
    let stripe = MockServer::start().await;

    mock_bin(
        &store,
        PRODUCTS_BIN,
        json!([{"id": "sealed-001", "title": "Booster Box", "price": 89.99}]),
    )
    .await;

    let base_url = spawn_app(test_config(&store.uri(), &stripe.uri())).await;
    let response = reqwest::get(format!("{base_url}/products"))
        .await
        .expect("request");

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let products: Vec<Value> = response.json().await.expect("JSON array");
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["title"], "Booster Box");
}

#[tokio::test]
async fn missing_products_bin_reads_as_empty() {
    let store = MockServer::start().await;
    let stripe = MockServer::start().await;

    mock_bin_failure(&store, PRODUCTS_BIN, 404).await;

    let base_url = spawn_app(test_config(&store.uri(), &stripe.uri())).await;
    let response = reqwest::get(format!("{base_url}/products"))
        .await
        .expect("request");

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let products: Vec<Value> = response.json().await.expect("JSON array");
    assert!(products.is_empty());
}

#[tokio::test]
async fn upstream_auth_failure_maps_to_401() {
    let store = MockServer::start().await;
    let stripe = MockServer::start().await;

    mock_bin_failure(&store, PRODUCTS_BIN, 401).await;

    let base_url = spawn_app(test_config(&store.uri(), &stripe.uri())).await;
    let response = reqwest::get(format!("{base_url}/products"))
        .await
        .expect("request");

    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn add_appends_product_and_mirrors_to_index() {
    let store = MockServer::start().await;
    let stripe = MockServer::start().await;

    let products = mock_stateful_bin(&store, PRODUCTS_BIN, json!([])).await;
    let master = mock_stateful_bin(&store, MASTER_BIN, master_doc(json!([]))).await;

    let base_url = spawn_app(test_config(&store.uri(), &stripe.uri())).await;
    let response = post_products(
        &base_url,
        json!({
            "action": "add",
            "product": {"id": "acc-001", "title": "Sleeves", "category": "accessories", "stock": 20, "price": 7.99}
        }),
    )
    .await;

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await.expect("JSON");
    assert_eq!(body["success"], true);
    assert_eq!(body["product"]["id"], "acc-001");

    assert_eq!(products.current()[0]["id"], "acc-001");
    let row = &master.current()["inventory"][0];
    assert_eq!(row["productId"], "acc-001");
    assert_eq!(row["binId"], PRODUCTS_BIN);
    assert_eq!(row["stock"], 20);
}

#[tokio::test]
async fn add_duplicate_id_conflicts() {
    let store = MockServer::start().await;
    let stripe = MockServer::start().await;

    mock_stateful_bin(&store, PRODUCTS_BIN, json!([{"id": "acc-001"}])).await;
    mock_stateful_bin(&store, MASTER_BIN, master_doc(json!([]))).await;

    let base_url = spawn_app(test_config(&store.uri(), &stripe.uri())).await;
    let response = post_products(
        &base_url,
        json!({"action": "add", "product": {"id": "acc-001"}}),
    )
    .await;

    assert_eq!(response.status(), reqwest::StatusCode::CONFLICT);
    let body: Value = response.json().await.expect("JSON");
    assert_eq!(body["error"], "Product with this ID already exists");
}

#[tokio::test]
async fn update_merges_fields_shallowly() {
    let store = MockServer::start().await;
    let stripe = MockServer::start().await;

    let products = mock_stateful_bin(
        &store,
        PRODUCTS_BIN,
        json!([{"id": "acc-001", "title": "Sleeves", "price": 7.99, "stock": 20, "category": "accessories"}]),
    )
    .await;
    mock_stateful_bin(&store, MASTER_BIN, master_doc(json!([]))).await;

    let base_url = spawn_app(test_config(&store.uri(), &stripe.uri())).await;
    let response = post_products(
        &base_url,
        json!({"action": "update", "product": {"id": "acc-001", "price": 6.50}}),
    )
    .await;

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let stored = products.current();
    // Updated field changed, untouched fields survive
    assert_eq!(stored[0]["price"], 6.5);
    assert_eq!(stored[0]["title"], "Sleeves");
}

#[tokio::test]
async fn update_unknown_product_is_not_found() {
    let store = MockServer::start().await;
    let stripe = MockServer::start().await;

    mock_stateful_bin(&store, PRODUCTS_BIN, json!([])).await;
    mock_stateful_bin(&store, MASTER_BIN, master_doc(json!([]))).await;

    let base_url = spawn_app(test_config(&store.uri(), &stripe.uri())).await;
    let response = post_products(
        &base_url,
        json!({"action": "update", "product": {"id": "ghost"}}),
    )
    .await;

    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_product_and_index_row() {
    let store = MockServer::start().await;
    let stripe = MockServer::start().await;

    let products = mock_stateful_bin(&store, PRODUCTS_BIN, json!([{"id": "acc-001"}])).await;
    let master = mock_stateful_bin(
        &store,
        MASTER_BIN,
        master_doc(json!([
            {"productId": "acc-001", "binId": PRODUCTS_BIN, "category": "accessories", "stock": 20}
        ])),
    )
    .await;

    let base_url = spawn_app(test_config(&store.uri(), &stripe.uri())).await;
    let response = post_products(&base_url, json!({"action": "delete", "productId": "acc-001"})).await;

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await.expect("JSON");
    assert_eq!(body["deleted"]["id"], "acc-001");

    assert_eq!(products.current(), json!([]));
    assert_eq!(master.current()["inventory"], json!([]));
}

#[tokio::test]
async fn index_failure_does_not_fail_the_product_write() {
    let store = MockServer::start().await;
    let stripe = MockServer::start().await;

    let products = mock_stateful_bin(&store, PRODUCTS_BIN, json!([])).await;
    // Master bin is down entirely
    mock_bin_failure(&store, MASTER_BIN, 500).await;

    let base_url = spawn_app(test_config(&store.uri(), &stripe.uri())).await;
    let response = post_products(
        &base_url,
        json!({"action": "add", "product": {"id": "acc-001", "category": "accessories", "stock": 5}}),
    )
    .await;

    // The product write succeeded; the index mirror failure was only logged
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(products.current()[0]["id"], "acc-001");
}
