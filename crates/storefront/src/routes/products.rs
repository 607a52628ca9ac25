//! Product CRUD route handlers.
//!
//! The products bin holds sealed goods, accessories, and prints as a bare
//! JSON array. Every write is mirrored into the master inventory index
//! best-effort: an index failure is logged but does not fail the product
//! write that already happened.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, instrument, warn};

use torp_tcg_core::{BinId, Category, ProductId, Stock};

use crate::error::{AppError, Result};
use crate::inventory::adjust::{remove_index_row, upsert_index_row};
use crate::jsonbin::{BinStoreError, InventoryRow};
use crate::state::AppState;

/// Product CRUD request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    pub action: String,
    pub product: Option<Value>,
    pub product_id: Option<ProductId>,
    /// Target bin override; defaults to the products bin.
    pub bin_id: Option<BinId>,
}

/// Serve the product list.
///
/// A missing bin reads as an empty catalogue rather than an error.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Value>>> {
    let products_bin = &state.config().bins.products_bin;
    match state.bins().read(products_bin).await {
        Ok(doc) => Ok(Json(doc.as_array().cloned().unwrap_or_default())),
        Err(BinStoreError::Api { status: 404, .. }) => {
            warn!(bin = %products_bin, "Products bin not found, returning empty list");
            Ok(Json(Vec::new()))
        }
        Err(err) => Err(err.into()),
    }
}

/// Add, update, or delete a product.
#[instrument(skip(state, request), fields(action = %request.action))]
pub async fn update(
    State(state): State<AppState>,
    Json(request): Json<ProductRequest>,
) -> Result<Json<Value>> {
    let target_bin = request
        .bin_id
        .clone()
        .unwrap_or_else(|| state.config().bins.products_bin.clone());

    match request.action.as_str() {
        "add" => {
            let product = request
                .product
                .ok_or_else(|| AppError::BadRequest("Product data with ID is required".into()))?;
            add_product(&state, &target_bin, product).await
        }
        "update" => {
            let product = request
                .product
                .ok_or_else(|| AppError::BadRequest("Product data with ID is required".into()))?;
            update_product(&state, &target_bin, product).await
        }
        "delete" => {
            let product_id = request
                .product_id
                .ok_or_else(|| AppError::BadRequest("Product ID is required".into()))?;
            delete_product(&state, &target_bin, &product_id).await
        }
        _ => Err(AppError::BadRequest("Invalid action".into())),
    }
}

async fn add_product(state: &AppState, bin: &BinId, product: Value) -> Result<Json<Value>> {
    let product_id = required_id(&product)?;
    let mut products = read_product_list(state, bin).await?;

    if products.iter().any(|p| has_id(p, &product_id)) {
        return Err(AppError::Conflict(
            "Product with this ID already exists".into(),
        ));
    }

    products.push(product.clone());
    state.bins().write(bin, &Value::Array(products)).await?;
    info!(product = %product_id, bin = %bin, "Added product");

    mirror_to_index(state, bin, &product, &product_id).await;

    Ok(Json(json!({ "success": true, "product": product })))
}

async fn update_product(state: &AppState, bin: &BinId, product: Value) -> Result<Json<Value>> {
    let product_id = required_id(&product)?;
    let mut products = read_product_list(state, bin).await?;

    let position = products
        .iter()
        .position(|p| has_id(p, &product_id))
        .ok_or_else(|| AppError::NotFound("Product not found".into()))?;

    // Shallow field merge onto the stored record
    let merged = match (products.get(position), product.as_object()) {
        (Some(Value::Object(existing)), Some(updates)) => {
            let mut fields = existing.clone();
            for (key, value) in updates {
                fields.insert(key.clone(), value.clone());
            }
            Value::Object(fields)
        }
        _ => product.clone(),
    };
    if let Some(slot) = products.get_mut(position) {
        *slot = merged.clone();
    }

    state.bins().write(bin, &Value::Array(products)).await?;
    info!(product = %product_id, bin = %bin, "Updated product");

    mirror_to_index(state, bin, &merged, &product_id).await;

    Ok(Json(json!({ "success": true, "product": merged })))
}

async fn delete_product(
    state: &AppState,
    bin: &BinId,
    product_id: &ProductId,
) -> Result<Json<Value>> {
    let mut products = read_product_list(state, bin).await?;

    let position = products
        .iter()
        .position(|p| has_id(p, product_id))
        .ok_or_else(|| AppError::NotFound("Product not found".into()))?;

    let deleted = products.remove(position);
    state.bins().write(bin, &Value::Array(products)).await?;
    info!(product = %product_id, bin = %bin, "Deleted product");

    if let Err(err) = remove_index_row(state.bins(), &state.config().bins, product_id).await {
        warn!(error = %err, "Failed to update master inventory");
    }

    Ok(Json(json!({ "success": true, "deleted": deleted })))
}

/// Read the bin's bare product array; a missing bin is an empty list.
async fn read_product_list(state: &AppState, bin: &BinId) -> Result<Vec<Value>> {
    match state.bins().read_fresh(bin).await {
        Ok(doc) => Ok(doc.as_array().cloned().unwrap_or_default()),
        Err(BinStoreError::Api { status: 404, .. }) => Ok(Vec::new()),
        Err(err) => Err(err.into()),
    }
}

/// Upsert the product's master index row. Best-effort: failures are logged,
/// not surfaced, because the detail bin write already succeeded.
async fn mirror_to_index(state: &AppState, bin: &BinId, product: &Value, product_id: &ProductId) {
    let row = InventoryRow {
        product_id: product_id.clone(),
        bin_id: bin.clone(),
        category: product
            .get("category")
            .and_then(Value::as_str)
            .map_or_else(|| Category::new("uncategorised"), Category::new),
        stock: product
            .get("stock")
            .and_then(Value::as_u64)
            .and_then(|s| u32::try_from(s).ok())
            .map_or(Stock::ZERO, Stock::new),
        price: None,
        pre_order: product
            .get("madeToOrder")
            .or_else(|| product.get("preOrder"))
            .and_then(Value::as_bool)
            .unwrap_or(false),
    };

    if let Err(err) = upsert_index_row(state.bins(), &state.config().bins, row).await {
        warn!(error = %err, "Failed to update master inventory");
    }
}

fn required_id(product: &Value) -> Result<ProductId> {
    product
        .get("id")
        .and_then(Value::as_str)
        .map(ProductId::new)
        .ok_or_else(|| AppError::BadRequest("Product data with ID is required".into()))
}

fn has_id(product: &Value, product_id: &ProductId) -> bool {
    product.get("id").and_then(Value::as_str) == Some(product_id.as_str())
}
