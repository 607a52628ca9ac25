//! Card gallery aggregation.
//!
//! The gallery view pulls every domain bin (six single-domain bins plus the
//! dual bin) and concatenates their card records into the nested document
//! shape the browser gallery was built against:
//! `{"page": {"cards": {"items": [...]}}}`.

use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

use crate::config::BinStoreConfig;
use crate::jsonbin::{BinClient, DetailRecord, extract_records};

/// The gallery document served to the browser.
#[derive(Debug, Clone, Serialize)]
pub struct GalleryDocument {
    pub page: GalleryPage,
}

#[derive(Debug, Clone, Serialize)]
pub struct GalleryPage {
    pub cards: GalleryCards,
}

#[derive(Debug, Clone, Serialize)]
pub struct GalleryCards {
    pub items: Vec<Value>,
}

impl GalleryDocument {
    fn new(items: Vec<Value>) -> Self {
        Self {
            page: GalleryPage {
                cards: GalleryCards { items },
            },
        }
    }

    /// Whether no bin contributed any cards.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.page.cards.items.is_empty()
    }
}

/// Aggregate every domain bin into one gallery document.
///
/// Bins are fetched concurrently and failures are tolerated per bin: a bin
/// that cannot be read or has an unknown structure contributes nothing.
#[instrument(skip(client, config))]
pub async fn load_gallery(client: &BinClient, config: &BinStoreConfig) -> GalleryDocument {
    let mut tasks = JoinSet::new();
    for (index, (domain, bin_id)) in config.gallery_bins().into_iter().enumerate() {
        let client = client.clone();
        tasks.spawn(async move {
            let cards = match client.read(&bin_id).await {
                Ok(doc) => extract_records(&doc).map_or_else(
                    || {
                        warn!(domain, bin = %bin_id, "Unrecognized bin structure");
                        Vec::new()
                    },
                    |records| records.into_iter().map(DetailRecord::into_value).collect(),
                ),
                Err(err) => {
                    warn!(domain, bin = %bin_id, error = %err, "Failed to fetch domain bin");
                    Vec::new()
                }
            };
            debug!(domain, count = cards.len(), "Loaded domain cards");
            (index, cards)
        });
    }

    let mut parts: Vec<(usize, Vec<Value>)> = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(part) => parts.push(part),
            Err(err) => warn!(error = %err, "Domain bin task panicked"),
        }
    }
    parts.sort_by_key(|(index, _)| *index);

    let items: Vec<Value> = parts.into_iter().flat_map(|(_, cards)| cards).collect();
    debug!(total = items.len(), "Loaded card gallery");

    GalleryDocument::new(items)
}
