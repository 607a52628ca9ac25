//! Stripe API client for Checkout Sessions.
//!
//! Talks to Stripe's REST API directly with form-encoded bodies (Stripe does
//! not accept JSON requests). Only the Checkout Session surface is wrapped;
//! webhook payloads are plain JSON handled in the webhook route.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use torp_tcg_core::{CurrencyCode, ProductId};

use crate::config::StripeConfig;

/// Errors that can occur when interacting with the Stripe API.
#[derive(Debug, Error)]
pub enum StripeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Client construction failed.
    #[error("Client configuration error: {0}")]
    Config(String),
}

/// One line item of a checkout session, priced server-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    /// Display name shown on the Stripe checkout page.
    pub name: String,
    /// Product image, when the record has one.
    pub image: Option<String>,
    /// Product id, carried in the line item's metadata.
    pub product_id: ProductId,
    /// Unit price in pence.
    pub unit_amount: i64,
    /// Units purchased.
    pub quantity: u32,
}

/// Parameters for creating a checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutSessionParams {
    pub line_items: Vec<LineItem>,
    pub success_url: String,
    pub cancel_url: String,
    /// Compact cart snapshot stored in session metadata for the webhook.
    pub cart_metadata: String,
}

/// A created checkout session.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    /// Hosted checkout page the browser redirects to.
    pub url: String,
}

/// Stripe API client.
#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    api_url: String,
}

impl StripeClient {
    /// Create a new Stripe API client.
    ///
    /// # Errors
    ///
    /// Returns [`StripeError::Config`] if the secret key cannot form an
    /// HTTP header.
    pub fn new(config: &StripeConfig) -> Result<Self, StripeError> {
        let mut headers = HeaderMap::new();
        let auth_value = format!("Bearer {}", config.secret_key.expose_secret());
        let mut auth = HeaderValue::from_str(&auth_value)
            .map_err(|e| StripeError::Config(format!("invalid secret key: {e}")))?;
        auth.set_sensitive(true);
        headers.insert("Authorization", auth);

        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Create a Checkout Session in payment mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, Stripe rejects it, or the
    /// response cannot be parsed.
    #[instrument(skip(self, params), fields(line_items = params.line_items.len()))]
    pub async fn create_checkout_session(
        &self,
        params: &CheckoutSessionParams,
    ) -> Result<CheckoutSession, StripeError> {
        let url = format!("{}/v1/checkout/sessions", self.api_url);
        let form = session_form(params);

        let response = self.client.post(&url).form(&form).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StripeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<CheckoutSession>()
            .await
            .map_err(|e| StripeError::Parse(e.to_string()))
    }
}

/// Flatten session parameters into Stripe's bracketed form encoding.
fn session_form(params: &CheckoutSessionParams) -> Vec<(String, String)> {
    let mut form = vec![
        ("mode".to_owned(), "payment".to_owned()),
        ("payment_method_types[0]".to_owned(), "card".to_owned()),
        ("success_url".to_owned(), params.success_url.clone()),
        ("cancel_url".to_owned(), params.cancel_url.clone()),
        (
            "metadata[cart_items]".to_owned(),
            params.cart_metadata.clone(),
        ),
    ];

    for (i, item) in params.line_items.iter().enumerate() {
        let prefix = format!("line_items[{i}]");
        form.push((
            format!("{prefix}[price_data][currency]"),
            CurrencyCode::GBP.as_lowercase().to_owned(),
        ));
        form.push((
            format!("{prefix}[price_data][product_data][name]"),
            item.name.clone(),
        ));
        if let Some(image) = &item.image {
            form.push((
                format!("{prefix}[price_data][product_data][images][0]"),
                image.clone(),
            ));
        }
        form.push((
            format!("{prefix}[price_data][product_data][metadata][id]"),
            item.product_id.to_string(),
        ));
        form.push((
            format!("{prefix}[price_data][unit_amount]"),
            item.unit_amount.to_string(),
        ));
        form.push((format!("{prefix}[quantity]"), item.quantity.to_string()));
    }

    form
}
