//! Shared helpers for Torp TCG integration tests.
//!
//! Each test spins up the real storefront router on an ephemeral port with
//! its configuration pointed at wiremock servers standing in for the
//! document store and Stripe. Tests then drive the HTTP API with `reqwest`
//! and assert on both the responses and the requests the service made
//! upstream.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use secrecy::SecretString;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use torp_tcg_core::BinId;
use torp_tcg_storefront::config::{BinStoreConfig, StorefrontConfig, StripeConfig};
use torp_tcg_storefront::state::AppState;

/// Bin ids used across the test suites.
pub const MASTER_BIN: &str = "bin-master";
pub const PRODUCTS_BIN: &str = "bin-products";
pub const DUAL_BIN: &str = "bin-dual";

/// The six single-domain card bins, in gallery order.
pub const DOMAIN_BINS: &[(&str, &str)] = &[
    ("calm", "bin-calm"),
    ("fury", "bin-fury"),
    ("order", "bin-order"),
    ("chaos", "bin-chaos"),
    ("mind", "bin-mind"),
    ("body", "bin-body"),
];

/// A high-entropy key so the config would also pass `from_env` validation.
pub const TEST_KEY: &str = "k9$Qz2!vTr8@bN4#mW6^pJ1&";

/// Build a storefront configuration pointed at the given mock servers.
#[must_use]
pub fn test_config(bins_url: &str, stripe_url: &str) -> StorefrontConfig {
    StorefrontConfig {
        host: "127.0.0.1".parse().expect("loopback address"),
        port: 0,
        base_url: "https://shop.example".to_string(),
        bins: BinStoreConfig {
            api_url: bins_url.to_string(),
            api_key: SecretString::from(TEST_KEY),
            master_inventory_bin: BinId::new(MASTER_BIN),
            products_bin: BinId::new(PRODUCTS_BIN),
            domain_bins: DOMAIN_BINS
                .iter()
                .map(|&(domain, bin)| (domain.to_owned(), BinId::new(bin)))
                .collect(),
            dual_bin: BinId::new(DUAL_BIN),
        },
        stripe: StripeConfig {
            api_url: stripe_url.to_string(),
            secret_key: SecretString::from(TEST_KEY),
        },
        sentry_dsn: None,
    }
}

/// Spawn the storefront app on an ephemeral port; returns its base URL.
///
/// # Panics
///
/// Panics if the app cannot be built or bound - test setup failures.
pub async fn spawn_app(config: StorefrontConfig) -> String {
    let state = AppState::new(config).expect("app state");
    let app = torp_tcg_storefront::app(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr: SocketAddr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        axum_serve(listener, app).await;
    });

    format!("http://{addr}")
}

async fn axum_serve(listener: tokio::net::TcpListener, app: axum::Router) {
    axum::serve(listener, app).await.expect("server error");
}

/// Mount a GET mock serving `record` for the given bin (enveloped, as the
/// store returns it).
pub async fn mock_bin(server: &MockServer, bin: &str, record: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/v3/b/{bin}/latest")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "record": record,
            "metadata": {"id": bin}
        })))
        .mount(server)
        .await;
}

/// A mock bin that replays writes: PUTs replace its document and subsequent
/// GETs serve the replacement, like the real store. Needed wherever the
/// service runs several read-modify-write cycles against one bin.
#[derive(Clone)]
pub struct StatefulBin {
    doc: Arc<Mutex<Value>>,
}

impl StatefulBin {
    /// The bin's current document.
    ///
    /// # Panics
    ///
    /// Panics if the lock is poisoned (a responder panicked mid-update).
    #[must_use]
    pub fn current(&self) -> Value {
        self.doc.lock().expect("bin lock").clone()
    }
}

struct StatefulRead(StatefulBin);

impl Respond for StatefulRead {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({ "record": self.0.current() }))
    }
}

struct StatefulWrite(StatefulBin);

impl Respond for StatefulWrite {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        match serde_json::from_slice::<Value>(&request.body) {
            Ok(doc) => {
                *self.0.doc.lock().expect("bin lock") = doc;
                ResponseTemplate::new(200).set_body_json(json!({"record": {}}))
            }
            Err(_) => ResponseTemplate::new(400),
        }
    }
}

/// Mount a stateful bin: GETs serve the current document, PUTs replace it.
pub async fn mock_stateful_bin(server: &MockServer, bin: &str, initial: Value) -> StatefulBin {
    let state = StatefulBin {
        doc: Arc::new(Mutex::new(initial)),
    };

    Mock::given(method("GET"))
        .and(path(format!("/v3/b/{bin}/latest")))
        .respond_with(StatefulRead(state.clone()))
        .mount(server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("/v3/b/{bin}")))
        .respond_with(StatefulWrite(state.clone()))
        .mount(server)
        .await;

    state
}

/// Mount a failing GET mock for the given bin.
pub async fn mock_bin_failure(server: &MockServer, bin: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/v3/b/{bin}/latest")))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Mount a PUT mock accepting writes to the given bin.
pub async fn mock_bin_write(server: &MockServer, bin: &str) {
    Mock::given(method("PUT"))
        .and(path(format!("/v3/b/{bin}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"record": {}})))
        .mount(server)
        .await;
}

/// Serve empty documents for every domain bin (so merges and repairs that
/// touch them all have something to read).
pub async fn mock_empty_domain_bins(server: &MockServer) {
    for &(_, bin) in DOMAIN_BINS {
        mock_bin(server, bin, json!({"page": {"cards": {"items": []}}})).await;
    }
    mock_bin(server, DUAL_BIN, json!({"page": {"cards": {"items": []}}})).await;
}

/// The JSON bodies of every PUT the store received for `bin`, oldest first.
///
/// # Panics
///
/// Panics if a recorded body is not valid JSON.
pub async fn put_bodies(server: &MockServer, bin: &str) -> Vec<Value> {
    let wanted = format!("/v3/b/{bin}");
    server
        .received_requests()
        .await
        .expect("request recording enabled")
        .into_iter()
        .filter(|r| r.method.as_str() == "PUT" && r.url.path() == wanted)
        .map(|r| serde_json::from_slice(&r.body).expect("valid JSON body"))
        .collect()
}

/// A master inventory document with the given rows.
#[must_use]
pub fn master_doc(rows: Value) -> Value {
    json!({ "inventory": rows })
}
