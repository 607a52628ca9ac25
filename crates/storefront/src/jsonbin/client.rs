//! HTTP client for the JSONBin document store.
//!
//! Wraps `reqwest` with the store's envelope handling, access-key auth, and a
//! 5-minute read cache. One client instance is shared across all handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use torp_tcg_core::BinId;

use super::BinStoreError;
use crate::config::BinStoreConfig;

/// How long a cached bin read stays fresh.
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Upper bound on distinct bins held in the cache.
const CACHE_CAPACITY: u64 = 100;

/// Client for the JSONBin document store.
///
/// Reads are cached for five minutes; [`BinClient::read_fresh`] bypasses the
/// cache for read-modify-write cycles, and [`BinClient::write`] refreshes the
/// cached entry after a successful PUT.
#[derive(Clone)]
pub struct BinClient {
    inner: Arc<BinClientInner>,
}

struct BinClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<BinId, Arc<Value>>,
}

impl BinClient {
    /// Create a new document store client.
    ///
    /// # Errors
    ///
    /// Returns [`BinStoreError::Config`] if the endpoint URL is invalid or
    /// the access key cannot form an HTTP header.
    pub fn new(config: &BinStoreConfig) -> Result<Self, BinStoreError> {
        let mut headers = HeaderMap::new();
        let mut access_key = HeaderValue::from_str(config.api_key.expose_secret())
            .map_err(|e| BinStoreError::Config(format!("invalid access key: {e}")))?;
        access_key.set_sensitive(true);
        headers.insert("X-Access-Key", access_key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        // Normalise: exactly one trailing slash so joins keep the full path.
        let normalised = format!("{}/", config.api_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| BinStoreError::Config(format!("invalid endpoint '{}': {e}", config.api_url)))?;

        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(BinClientInner {
                client,
                base_url,
                cache,
            }),
        })
    }

    /// Read a bin's record, serving from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure, non-success status, or a body
    /// that is not valid JSON.
    #[instrument(skip(self), fields(bin = %bin))]
    pub async fn read(&self, bin: &BinId) -> Result<Arc<Value>, BinStoreError> {
        if let Some(record) = self.inner.cache.get(bin).await {
            debug!("Cache hit");
            return Ok(record);
        }
        self.read_fresh(bin).await
    }

    /// Read a bin's record, bypassing the cache.
    ///
    /// Stock mutations read through this method so the modify-write step
    /// starts from the store's latest state rather than a cached copy.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure, non-success status, or a body
    /// that is not valid JSON.
    #[instrument(skip(self), fields(bin = %bin))]
    pub async fn read_fresh(&self, bin: &BinId) -> Result<Arc<Value>, BinStoreError> {
        let url = self.bin_url(bin, true)?;
        let response = self.inner.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BinStoreError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response.json().await.map_err(|e| BinStoreError::Parse {
            bin: bin.to_string(),
            message: e.to_string(),
        })?;

        let record = Arc::new(unwrap_envelope(body));
        self.inner.cache.insert(bin.clone(), Arc::clone(&record)).await;

        Ok(record)
    }

    /// Overwrite a bin's record with `record`.
    ///
    /// The PUT replaces the whole document; the cache entry is refreshed with
    /// the written value so subsequent reads see the update immediately.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure or non-success status.
    #[instrument(skip(self, record), fields(bin = %bin))]
    pub async fn write(&self, bin: &BinId, record: &Value) -> Result<(), BinStoreError> {
        let url = self.bin_url(bin, false)?;
        let response = self.inner.client.put(url).json(record).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BinStoreError::Api {
                status: status.as_u16(),
                message,
            });
        }

        self.inner
            .cache
            .insert(bin.clone(), Arc::new(record.clone()))
            .await;

        Ok(())
    }

    /// Drop a single bin from the cache.
    pub async fn invalidate(&self, bin: &BinId) {
        self.inner.cache.invalidate(bin).await;
    }

    /// Drop all cached bins.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }

    /// Build the bin URL. Reads use the `/latest` view; writes address the
    /// bin directly.
    fn bin_url(&self, bin: &BinId, latest: bool) -> Result<Url, BinStoreError> {
        let path = if latest {
            format!("v3/b/{bin}/latest")
        } else {
            format!("v3/b/{bin}")
        };
        self.inner
            .base_url
            .join(&path)
            .map_err(|e| BinStoreError::Config(format!("invalid bin id '{bin}': {e}")))
    }
}

/// Unwrap the store's `{"record": ...}` envelope, tolerating bare payloads.
fn unwrap_envelope(mut body: Value) -> Value {
    match body.get_mut("record") {
        Some(record) => record.take(),
        None => body,
    }
}
