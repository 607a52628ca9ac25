//! Record types stored in bins.
//!
//! The master inventory has a fixed schema; detail bins do not. Sealed goods
//! are flat objects (`{id, title, price, image}`) while card records are
//! deeply nested exports (`{publicCode, name, cardImage: {url}, domain:
//! {values: [...]}, ...}`), and the container around the records differs per
//! bin. [`DetailRecord`] therefore wraps raw JSON with lenient accessors
//! instead of forcing one schema.

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use torp_tcg_core::{BinId, Category, ProductId, Stock};

// =============================================================================
// Master inventory
// =============================================================================

/// One row of the master inventory index: one sellable unit and where its
/// descriptive record lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRow {
    pub product_id: ProductId,
    pub bin_id: BinId,
    pub category: Category,
    pub stock: Stock,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub pre_order: bool,
}

/// The master inventory document: `{"inventory": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MasterInventory {
    #[serde(default)]
    pub inventory: Vec<InventoryRow>,
}

impl MasterInventory {
    /// Find the index of a product's row.
    #[must_use]
    pub fn position(&self, product_id: &ProductId) -> Option<usize> {
        self.inventory
            .iter()
            .position(|row| &row.product_id == product_id)
    }
}

// =============================================================================
// Detail records
// =============================================================================

/// A product or card detail record of unknown shape.
///
/// Field access mirrors how the data is actually keyed across bins: ids live
/// under `id` or `publicCode`, display names under `title` or `name`, images
/// under `image` or `cardImage.url`.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailRecord(Value);

impl DetailRecord {
    /// Wrap a raw JSON record.
    #[must_use]
    pub const fn new(value: Value) -> Self {
        Self(value)
    }

    /// The raw JSON.
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consume the wrapper, returning the raw JSON.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Primary identifier: `id`, falling back to `publicCode`.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.0
            .get("id")
            .and_then(Value::as_str)
            .or_else(|| self.0.get("publicCode").and_then(Value::as_str))
    }

    /// Whether this record belongs to the given product: the inventory row's
    /// product id may match either `id` or `publicCode`.
    #[must_use]
    pub fn matches(&self, product_id: &ProductId) -> bool {
        let wanted = product_id.as_str();
        self.0.get("id").and_then(Value::as_str) == Some(wanted)
            || self.0.get("publicCode").and_then(Value::as_str) == Some(wanted)
    }

    /// Display title: `title`, falling back to `name`.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.0
            .get("title")
            .and_then(Value::as_str)
            .or_else(|| self.0.get("name").and_then(Value::as_str))
    }

    /// Image URL: `image`, falling back to `cardImage.url`.
    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.0
            .get("image")
            .and_then(Value::as_str)
            .or_else(|| {
                self.0
                    .get("cardImage")
                    .and_then(|img| img.get("url"))
                    .and_then(Value::as_str)
            })
    }

    /// Listed price, if the record carries one.
    #[must_use]
    pub fn price(&self) -> Option<Decimal> {
        match self.0.get("price")? {
            Value::Number(n) => n.as_f64().and_then(Decimal::from_f64),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Number of domains the card belongs to (`domain.values` length).
    #[must_use]
    pub fn domain_count(&self) -> usize {
        self.0
            .get("domain")
            .and_then(|d| d.get("values"))
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    /// Whether the card belongs to two or more domains and must route to the
    /// shared dual bin.
    #[must_use]
    pub fn is_dual_domain(&self) -> bool {
        self.domain_count() >= 2
    }
}

impl From<Value> for DetailRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

// =============================================================================
// Container shapes
// =============================================================================

/// How a bin wraps its record list. Only the products bin is written back
/// through [`push_record`], so only the shapes that bin uses are tracked for
/// re-serialization; the rest exist to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerShape {
    /// `{"products": [...]}`
    WrappedProducts,
    /// A bare JSON array.
    Bare,
}

/// Extract the record list from a bin document, whatever its container.
///
/// Recognized shapes, in order: `{products: [...]}`, a bare array,
/// `{page: {cards: {items: [...]}}}`, `{cards: [...]}`, `{items: [...]}`.
/// Returns `None` for unrecognized documents so callers can log the shape.
#[must_use]
pub fn extract_records(doc: &Value) -> Option<Vec<DetailRecord>> {
    let records = if let Some(products) = doc.get("products").and_then(Value::as_array) {
        products
    } else if let Some(array) = doc.as_array() {
        array
    } else if let Some(items) = doc
        .get("page")
        .and_then(|p| p.get("cards"))
        .and_then(|c| c.get("items"))
        .and_then(Value::as_array)
    {
        items
    } else if let Some(cards) = doc.get("cards").and_then(Value::as_array) {
        cards
    } else if let Some(items) = doc.get("items").and_then(Value::as_array) {
        items
    } else {
        return None;
    };

    Some(records.iter().cloned().map(DetailRecord::new).collect())
}

/// Append a record to a product bin document, preserving its container shape.
///
/// Returns the shape that was detected, or `None` if the document is neither
/// a wrapped product list nor a bare array.
pub fn push_record(doc: &mut Value, record: Value) -> Option<ContainerShape> {
    if let Some(products) = doc.get_mut("products").and_then(Value::as_array_mut) {
        products.push(record);
        return Some(ContainerShape::WrappedProducts);
    }
    if let Some(array) = doc.as_array_mut() {
        array.push(record);
        return Some(ContainerShape::Bare);
    }
    None
}
