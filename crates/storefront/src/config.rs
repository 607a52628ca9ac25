//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `JSONBIN_API_KEY` - Document store access key (high entropy)
//! - `MASTER_INVENTORY_BIN_ID` - Bin holding the master inventory index
//! - `PRODUCTS_BIN_ID` - Bin holding sealed products/accessories/prints
//! - `CALM_BIN_ID`, `FURY_BIN_ID`, `ORDER_BIN_ID`, `CHAOS_BIN_ID`,
//!   `MIND_BIN_ID`, `BODY_BIN_ID` - Single-domain card bins
//! - `DUAL_BIN_ID` - Shared bin for dual-domain cards
//! - `STRIPE_SECRET_KEY` - Stripe API secret key
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `URL` - Public base URL for checkout redirects (default: http://localhost:8080)
//! - `JSONBIN_API_URL` - Document store endpoint (default: https://api.jsonbin.io)
//! - `STRIPE_API_URL` - Stripe endpoint (default: https://api.stripe.com)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;
use torp_tcg_core::BinId;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// The six single-domain card bins, keyed by the env var that names each.
const DOMAIN_BIN_VARS: &[(&str, &str)] = &[
    ("calm", "CALM_BIN_ID"),
    ("fury", "FURY_BIN_ID"),
    ("order", "ORDER_BIN_ID"),
    ("chaos", "CHAOS_BIN_ID"),
    ("mind", "MIND_BIN_ID"),
    ("body", "BODY_BIN_ID"),
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for checkout success/cancel redirects
    pub base_url: String,
    /// Document store configuration
    pub bins: BinStoreConfig,
    /// Stripe API configuration
    pub stripe: StripeConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Document store (JSONBin) configuration.
///
/// Implements `Debug` manually to redact the access key.
#[derive(Clone)]
pub struct BinStoreConfig {
    /// API endpoint, overridable so tests can point at a mock server
    pub api_url: String,
    /// Access key sent as `X-Access-Key` on every request
    pub api_key: SecretString,
    /// Bin treated as source of truth for stock counts and bin routing
    pub master_inventory_bin: BinId,
    /// Bin for sealed products, accessories, and prints
    pub products_bin: BinId,
    /// Single-domain card bins in gallery order
    pub domain_bins: Vec<(String, BinId)>,
    /// Shared bin for cards belonging to two domains
    pub dual_bin: BinId,
}

impl BinStoreConfig {
    /// All bins served by the card gallery: the six single-domain bins plus
    /// the dual bin.
    #[must_use]
    pub fn gallery_bins(&self) -> Vec<(String, BinId)> {
        let mut bins = self.domain_bins.clone();
        bins.push(("dual".to_owned(), self.dual_bin.clone()));
        bins
    }
}

impl std::fmt::Debug for BinStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinStoreConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .field("master_inventory_bin", &self.master_inventory_bin)
            .field("products_bin", &self.products_bin)
            .field("domain_bins", &self.domain_bins)
            .field("dual_bin", &self.dual_bin)
            .finish()
    }
}

/// Stripe API configuration.
///
/// Implements `Debug` manually to redact the secret key.
#[derive(Clone)]
pub struct StripeConfig {
    /// API endpoint, overridable so tests can point at a mock server
    pub api_url: String,
    /// Secret key used as bearer auth
    pub secret_key: SecretString,
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("api_url", &self.api_url)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = get_env_or_default("URL", "http://localhost:8080");

        let bins = BinStoreConfig::from_env()?;
        let stripe = StripeConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            host,
            port,
            base_url,
            bins,
            stripe,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl BinStoreConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let domain_bins = DOMAIN_BIN_VARS
            .iter()
            .map(|&(domain, var)| Ok((domain.to_owned(), BinId::new(get_required_env(var)?))))
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self {
            api_url: get_env_or_default("JSONBIN_API_URL", "https://api.jsonbin.io"),
            api_key: get_validated_secret("JSONBIN_API_KEY")?,
            master_inventory_bin: BinId::new(get_required_env("MASTER_INVENTORY_BIN_ID")?),
            products_bin: BinId::new(get_required_env("PRODUCTS_BIN_ID")?),
            domain_bins,
            dual_bin: BinId::new(get_required_env("DUAL_BIN_ID")?),
        })
    }
}

impl StripeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: get_env_or_default("STRIPE_API_URL", "https://api.stripe.com"),
            secret_key: get_validated_secret("STRIPE_SECRET_KEY")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the key issued by the provider."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
