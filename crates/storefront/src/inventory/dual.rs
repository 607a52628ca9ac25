//! Dual-domain routing repair.
//!
//! A card belonging to two domains must have its master index row point at
//! the shared dual bin; a row left pointing at a single-domain bin makes the
//! merge miss the card. This scans the single-domain bins for dual-domain
//! cards and rewrites any misrouted rows.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{info, instrument, warn};

use torp_tcg_core::ProductId;

use super::adjust::{AdjustError, read_master, write_master};
use crate::config::BinStoreConfig;
use crate::jsonbin::{BinClient, extract_records};

/// Result of a repair pass.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairReport {
    /// Dual-domain cards discovered across the single-domain bins.
    pub dual_cards_found: usize,
    /// Master index rows that were rerouted to the dual bin.
    pub updated_count: usize,
    /// Total rows in the master index at scan time.
    pub inventory_size: usize,
}

/// Scan the single-domain bins and reroute dual-domain cards to the dual bin.
///
/// A second run over a repaired index reports zero updates.
///
/// # Errors
///
/// Returns an error if the master index cannot be read, parsed, or written.
/// Unreadable domain bins are skipped with a warning.
#[instrument(skip(client, config))]
pub async fn repair_dual_routing(
    client: &BinClient,
    config: &BinStoreConfig,
) -> Result<RepairReport, AdjustError> {
    let dual_card_ids = find_dual_cards(client, config).await;
    info!(count = dual_card_ids.len(), "Found dual-domain cards");

    let mut master = read_master(client, config).await?;
    let inventory_size = master.inventory.len();

    let mut updated_count = 0;
    for row in &mut master.inventory {
        if dual_card_ids.contains(&row.product_id) && row.bin_id != config.dual_bin {
            info!(
                product = %row.product_id,
                old_bin = %row.bin_id,
                new_bin = %config.dual_bin,
                "Rerouting dual-domain card"
            );
            row.bin_id = config.dual_bin.clone();
            updated_count += 1;
        }
    }

    if updated_count > 0 {
        write_master(client, config, &master).await?;
    }

    info!(updated_count, "Dual routing repair complete");
    Ok(RepairReport {
        dual_cards_found: dual_card_ids.len(),
        updated_count,
        inventory_size,
    })
}

/// Collect the ids of every dual-domain card found in the single-domain bins.
async fn find_dual_cards(client: &BinClient, config: &BinStoreConfig) -> HashSet<ProductId> {
    let mut dual_card_ids = HashSet::new();

    for (domain, bin_id) in &config.domain_bins {
        let doc = match client.read(bin_id).await {
            Ok(doc) => doc,
            Err(err) => {
                warn!(domain, bin = %bin_id, error = %err, "Skipping unreadable domain bin");
                continue;
            }
        };

        let records = extract_records(&doc).unwrap_or_else(|| {
            warn!(domain, bin = %bin_id, "Unrecognized bin structure");
            Vec::new()
        });

        for record in records {
            if record.is_dual_domain()
                && let Some(id) = record.id()
            {
                dual_card_ids.insert(ProductId::new(id));
            }
        }
    }

    dual_card_ids
}
