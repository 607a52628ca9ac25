//! Stock adjustment against the master inventory bin.
//!
//! Every mutation is a read-modify-write cycle: fetch the index uncached,
//! change it in memory, PUT the whole document back. The pure index edits
//! are split out so the clamping and routing rules can be tested without a
//! store.

use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, instrument, warn};

use torp_tcg_core::{BinId, Category, ProductId, Stock};

use crate::config::BinStoreConfig;
use crate::jsonbin::{BinClient, BinStoreError, DetailRecord, InventoryRow, MasterInventory, push_record};

/// Errors from stock adjustment operations.
#[derive(Debug, Error)]
pub enum AdjustError {
    /// The product has no row in the master index.
    #[error("Product not found")]
    ProductNotFound,

    /// A new row cannot be created without routing information.
    #[error("binId and category required for new items")]
    MissingRouting,

    /// A product payload lacked its id.
    #[error("Product data with ID is required")]
    MissingProductId,

    /// The target bin's container shape is not writable.
    #[error("Unrecognized structure in bin {0}")]
    UnwritableBin(BinId),

    /// The master inventory document did not parse.
    #[error("Master inventory parse error: {0}")]
    Parse(String),

    /// The document store call failed.
    #[error(transparent)]
    Store(#[from] BinStoreError),
}

/// An absolute stock update, optionally carrying price and routing changes.
#[derive(Debug, Clone)]
pub struct SetStockRequest {
    pub product_id: ProductId,
    pub stock: Stock,
    pub price: Option<Decimal>,
    pub bin_id: Option<BinId>,
    pub category: Option<Category>,
    pub pre_order: bool,
}

// =============================================================================
// Store orchestration
// =============================================================================

/// Apply a relative stock delta, clamped at zero.
///
/// Returns the resulting stock count.
///
/// # Errors
///
/// [`AdjustError::ProductNotFound`] if the product has no index row;
/// store/parse errors otherwise.
#[instrument(skip(client, config), fields(product = %product_id))]
pub async fn adjust_stock(
    client: &BinClient,
    config: &BinStoreConfig,
    product_id: &ProductId,
    delta: i64,
) -> Result<Stock, AdjustError> {
    let mut master = read_master(client, config).await?;
    let new_stock = apply_adjust(&mut master, product_id, delta)?;
    write_master(client, config, &master).await?;
    Ok(new_stock)
}

/// Apply an absolute stock update (with optional price/routing changes).
///
/// # Errors
///
/// [`AdjustError::MissingRouting`] when inserting a new row without
/// `bin_id`/`category`; store/parse errors otherwise.
#[instrument(skip(client, config, request), fields(product = %request.product_id))]
pub async fn set_stock(
    client: &BinClient,
    config: &BinStoreConfig,
    request: SetStockRequest,
) -> Result<(), AdjustError> {
    let mut master = read_master(client, config).await?;
    apply_set(&mut master, request)?;
    write_master(client, config, &master).await?;
    Ok(())
}

/// Create a product: append its record to the detail bin (preserving that
/// bin's container shape), then add its row to the master index.
///
/// # Errors
///
/// [`AdjustError::MissingProductId`] if the payload has no id;
/// [`AdjustError::UnwritableBin`] if the detail bin's shape is unknown;
/// store/parse errors otherwise.
#[instrument(skip(client, config, product), fields(bin = %bin_id))]
pub async fn create_product(
    client: &BinClient,
    config: &BinStoreConfig,
    product: Value,
    bin_id: BinId,
) -> Result<(), AdjustError> {
    let record = DetailRecord::new(product.clone());
    let product_id = record
        .id()
        .map(ProductId::new)
        .ok_or(AdjustError::MissingProductId)?;

    // 1. Append to the detail bin
    let mut bin_doc = (*client.read_fresh(&bin_id).await?).clone();
    if push_record(&mut bin_doc, product.clone()).is_none() {
        return Err(AdjustError::UnwritableBin(bin_id));
    }
    client.write(&bin_id, &bin_doc).await?;

    // 2. Add to the master index
    let mut master = read_master(client, config).await?;
    let row = index_row_for(&record, &product_id, &bin_id);
    upsert_row(&mut master, row);
    write_master(client, config, &master).await?;

    info!(product = %product_id, "Created product");
    Ok(())
}

/// Remove a product's row from the master index. The detail record is kept.
///
/// Deleting an unknown product is a no-op.
///
/// # Errors
///
/// Store/parse errors only.
#[instrument(skip(client, config), fields(product = %product_id))]
pub async fn delete_product(
    client: &BinClient,
    config: &BinStoreConfig,
    product_id: &ProductId,
) -> Result<(), AdjustError> {
    let mut master = read_master(client, config).await?;
    if apply_delete(&mut master, product_id) {
        info!("Deleted product from master inventory");
    }
    write_master(client, config, &master).await?;
    Ok(())
}

/// Upsert a master index row for a product (used by the product CRUD paths
/// to keep the index in step with detail-bin edits).
///
/// # Errors
///
/// Store/parse errors only.
pub async fn upsert_index_row(
    client: &BinClient,
    config: &BinStoreConfig,
    row: InventoryRow,
) -> Result<(), AdjustError> {
    let mut master = read_master(client, config).await?;
    upsert_row(&mut master, row);
    write_master(client, config, &master).await?;
    Ok(())
}

/// Remove a product's master index row if present (product CRUD counterpart
/// of [`upsert_index_row`]).
///
/// # Errors
///
/// Store/parse errors only.
pub async fn remove_index_row(
    client: &BinClient,
    config: &BinStoreConfig,
    product_id: &ProductId,
) -> Result<(), AdjustError> {
    let mut master = read_master(client, config).await?;
    if apply_delete(&mut master, product_id) {
        write_master(client, config, &master).await?;
    }
    Ok(())
}

/// Read the master inventory, bypassing the cache.
pub(crate) async fn read_master(
    client: &BinClient,
    config: &BinStoreConfig,
) -> Result<MasterInventory, AdjustError> {
    let doc = client.read_fresh(&config.master_inventory_bin).await?;
    serde_json::from_value((*doc).clone()).map_err(|e| AdjustError::Parse(e.to_string()))
}

/// Write the master inventory back as a whole document.
pub(crate) async fn write_master(
    client: &BinClient,
    config: &BinStoreConfig,
    master: &MasterInventory,
) -> Result<(), AdjustError> {
    let doc = serde_json::to_value(master).map_err(|e| AdjustError::Parse(e.to_string()))?;
    client.write(&config.master_inventory_bin, &doc).await?;
    Ok(())
}

// =============================================================================
// Pure index edits
// =============================================================================

/// Apply a clamped delta to a product's stock. The row stays in the index
/// even when it reaches zero.
fn apply_adjust(
    master: &mut MasterInventory,
    product_id: &ProductId,
    delta: i64,
) -> Result<Stock, AdjustError> {
    let position = master
        .position(product_id)
        .ok_or(AdjustError::ProductNotFound)?;
    let row = master
        .inventory
        .get_mut(position)
        .ok_or(AdjustError::ProductNotFound)?;

    let old_stock = row.stock;
    row.stock = old_stock.adjust(delta);
    info!(
        product = %product_id,
        old = %old_stock,
        delta,
        new = %row.stock,
        "Adjusted stock"
    );
    Ok(row.stock)
}

/// Apply an absolute stock update. Setting an existing row to zero removes
/// it; setting an unknown product with positive stock inserts a new row
/// (routing required).
fn apply_set(master: &mut MasterInventory, request: SetStockRequest) -> Result<(), AdjustError> {
    if let Some(position) = master.position(&request.product_id) {
        let row = master
            .inventory
            .get_mut(position)
            .ok_or(AdjustError::ProductNotFound)?;

        row.stock = request.stock;
        if let Some(price) = request.price {
            row.price = Some(price);
        }
        if let Some(bin_id) = request.bin_id {
            if row.bin_id != bin_id {
                info!(
                    product = %request.product_id,
                    old_bin = %row.bin_id,
                    new_bin = %bin_id,
                    "Updated bin routing"
                );
            }
            row.bin_id = bin_id;
        }

        if row.stock.is_depleted() {
            master.inventory.remove(position);
            info!(product = %request.product_id, "Removed product (stock depleted)");
        }
        return Ok(());
    }

    if request.stock.is_available() {
        let (Some(bin_id), Some(category)) = (request.bin_id, request.category) else {
            return Err(AdjustError::MissingRouting);
        };
        master.inventory.push(InventoryRow {
            product_id: request.product_id,
            bin_id,
            category,
            stock: request.stock,
            price: Some(request.price.unwrap_or_else(|| Decimal::new(50, 2))),
            pre_order: request.pre_order,
        });
    }

    Ok(())
}

/// Remove a product's row. Returns whether a row was removed.
fn apply_delete(master: &mut MasterInventory, product_id: &ProductId) -> bool {
    match master.position(product_id) {
        Some(position) => {
            master.inventory.remove(position);
            true
        }
        None => {
            warn!(product = %product_id, "Delete for product with no index row");
            false
        }
    }
}

/// Insert or replace a row keyed by product id.
fn upsert_row(master: &mut MasterInventory, row: InventoryRow) {
    match master.position(&row.product_id) {
        Some(position) => {
            if let Some(existing) = master.inventory.get_mut(position) {
                *existing = row;
            }
        }
        None => master.inventory.push(row),
    }
}

/// Build the index row for a newly created product from its detail record.
fn index_row_for(record: &DetailRecord, product_id: &ProductId, bin_id: &BinId) -> InventoryRow {
    let category = record
        .as_value()
        .get("category")
        .and_then(Value::as_str)
        .map_or_else(|| Category::new("uncategorised"), Category::new);
    let stock = record
        .as_value()
        .get("stock")
        .and_then(Value::as_u64)
        .and_then(|s| u32::try_from(s).ok())
        .map_or(Stock::ZERO, Stock::new);
    let pre_order = record
        .as_value()
        .get("madeToOrder")
        .or_else(|| record.as_value().get("preOrder"))
        .and_then(Value::as_bool)
        .unwrap_or(false);

    // No price on the row: the merge falls through to the detail record's
    // price, so detail-bin price edits keep taking effect.
    InventoryRow {
        product_id: product_id.clone(),
        bin_id: bin_id.clone(),
        category,
        stock,
        price: None,
        pre_order,
    }
}
