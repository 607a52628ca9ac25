//! Multi-bin inventory merge.
//!
//! Joins master inventory rows against the detail bins they route to and
//! returns the enriched product list the storefront renders. Bins are
//! fetched concurrently; a bin that fails to load contributes nothing rather
//! than failing the whole merge.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Map, Value, json};
use tokio::task::JoinSet;
use tracing::{instrument, warn};

use torp_tcg_core::BinId;

use crate::config::BinStoreConfig;
use crate::jsonbin::{BinClient, BinStoreError, DetailRecord, InventoryRow, MasterInventory, extract_records};

/// Fetch the master inventory and enrich every row with its detail record.
///
/// # Errors
///
/// Returns an error only if the master bin itself cannot be read or parsed;
/// detail bin failures degrade to empty groups.
#[instrument(skip(client, config))]
pub async fn merged_inventory(
    client: &BinClient,
    config: &BinStoreConfig,
) -> Result<Vec<Value>, BinStoreError> {
    let doc = client.read(&config.master_inventory_bin).await?;
    let master: MasterInventory =
        serde_json::from_value((*doc).clone()).map_err(|e| BinStoreError::Parse {
            bin: config.master_inventory_bin.to_string(),
            message: e.to_string(),
        })?;

    if master.inventory.is_empty() {
        return Ok(Vec::new());
    }

    let groups = group_by_bin(master.inventory);
    tracing::debug!(groups = groups.len(), "Grouped master inventory by bin");

    // Fetch every referenced bin concurrently; keep group order stable.
    let mut tasks = JoinSet::new();
    for (index, (bin_id, rows)) in groups.into_iter().enumerate() {
        let client = client.clone();
        tasks.spawn(async move {
            let enriched = match client.read(&bin_id).await {
                Ok(doc) => {
                    let records = extract_records(&doc).unwrap_or_else(|| {
                        warn!(bin = %bin_id, "Unrecognized bin structure");
                        Vec::new()
                    });
                    merge_rows(&rows, &records)
                }
                Err(err) => {
                    warn!(bin = %bin_id, error = %err, "Failed to fetch product bin");
                    Vec::new()
                }
            };
            (index, enriched)
        });
    }

    let mut parts: Vec<(usize, Vec<Value>)> = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(part) => parts.push(part),
            Err(err) => warn!(error = %err, "Bin fetch task panicked"),
        }
    }
    parts.sort_by_key(|(index, _)| *index);

    let products: Vec<Value> = parts.into_iter().flat_map(|(_, part)| part).collect();
    tracing::debug!(products = products.len(), "Merged inventory");

    Ok(products)
}

/// Group inventory rows by the bin their detail record lives in, preserving
/// first-seen bin order.
fn group_by_bin(rows: Vec<InventoryRow>) -> Vec<(BinId, Vec<InventoryRow>)> {
    let mut groups: Vec<(BinId, Vec<InventoryRow>)> = Vec::new();
    for row in rows {
        match groups.iter_mut().find(|(bin, _)| bin == &row.bin_id) {
            Some((_, group)) => group.push(row),
            None => groups.push((row.bin_id.clone(), vec![row])),
        }
    }
    groups
}

/// Join one bin's inventory rows against its detail records.
///
/// Rows with no matching record are dropped with a warning.
pub(crate) fn merge_rows(rows: &[InventoryRow], records: &[DetailRecord]) -> Vec<Value> {
    rows.iter()
        .filter_map(|row| {
            let record = records.iter().find(|r| r.matches(&row.product_id));
            match record {
                Some(record) => Some(enrich(record, row)),
                None => {
                    warn!(
                        product = %row.product_id,
                        bin = %row.bin_id,
                        "Product not found in bin"
                    );
                    None
                }
            }
        })
        .collect()
}

/// Build the enriched product: the raw detail record with the normalized
/// storefront fields layered on top.
fn enrich(record: &DetailRecord, row: &InventoryRow) -> Value {
    let mut fields: Map<String, Value> = match record.as_value() {
        Value::Object(map) => map.clone(),
        other => {
            warn!(product = %row.product_id, "Detail record is not an object");
            let mut map = Map::new();
            map.insert("raw".to_owned(), other.clone());
            map
        }
    };

    if let Some(title) = record.title() {
        fields.insert("title".to_owned(), Value::String(title.to_owned()));
    }
    fields.insert(
        "image".to_owned(),
        Value::String(record.image().unwrap_or_default().to_owned()),
    );
    fields.insert(
        "price".to_owned(),
        json!(resolve_price(row, record).to_f64().unwrap_or(0.0)),
    );
    fields.insert("stock".to_owned(), json!(row.stock.count()));
    fields.insert("category".to_owned(), json!(row.category.as_str()));
    fields.insert("available".to_owned(), json!(row.stock.is_available()));
    fields.insert("preOrder".to_owned(), json!(row.pre_order));

    Value::Object(fields)
}

/// Price resolution precedence: inventory row price, then detail record
/// price, then the category default.
fn resolve_price(row: &InventoryRow, record: &DetailRecord) -> Decimal {
    row.price
        .or_else(|| record.price())
        .unwrap_or_else(|| row.category.default_price())
}
