//! Document store ("bin") client and record types.
//!
//! # Architecture
//!
//! - The hosted JSONBin service is the only persistent store - no local
//!   database, direct API calls
//! - Reads go through `GET /v3/b/{id}/latest`, writes through `PUT /v3/b/{id}`,
//!   both authenticated with the `X-Access-Key` header
//! - Responses arrive wrapped in a `{"record": ...}` envelope
//! - In-memory caching via `moka` for bin reads (5 minute TTL); write paths
//!   bypass the cache and refresh it after a successful PUT
//!
//! # Example
//!
//! ```rust,ignore
//! use torp_tcg_storefront::jsonbin::BinClient;
//!
//! let client = BinClient::new(&config.bins)?;
//!
//! // Read the master inventory document
//! let doc = client.read(&config.bins.master_inventory_bin).await?;
//! let master: MasterInventory = serde_json::from_value((*doc).clone())?;
//!
//! // Write it back
//! client.write(&bin_id, &serde_json::to_value(&master)?).await?;
//! ```

mod client;
pub mod types;

pub use client::BinClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when interacting with the document store.
#[derive(Debug, Error)]
pub enum BinStoreError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The response body was not valid JSON or lacked the record envelope.
    #[error("Parse error for bin {bin}: {message}")]
    Parse { bin: String, message: String },

    /// Client construction failed (bad endpoint or key material).
    #[error("Client configuration error: {0}")]
    Config(String),
}
