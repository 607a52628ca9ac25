//! The client shopping basket payload.
//!
//! The browser persists the basket under `localStorage["torptcg_basket"]` as
//! a JSON array of entries and posts the same array to the checkout endpoint
//! as `{"cart": [...]}`.  This module owns that schema and its arithmetic so
//! the server and any future clients agree on the shape.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// The key the browser stores the basket under.
pub const STORAGE_KEY: &str = "torptcg_basket";

/// A single basket line: one product and how many of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasketEntry {
    pub id: ProductId,
    pub title: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub image: String,
    pub quantity: u32,
}

/// An ordered collection of basket entries, keyed by product id.
///
/// Serializes as a bare JSON array, matching the stored payload exactly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Basket {
    entries: Vec<BasketEntry>,
}

impl Basket {
    /// Create an empty basket.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add an entry. If the product is already in the basket, its quantity
    /// is increased instead of adding a duplicate line.
    pub fn add(&mut self, entry: BasketEntry) {
        if let Some(existing) = self.entries.iter_mut().find(|e| e.id == entry.id) {
            existing.quantity += entry.quantity;
        } else {
            self.entries.push(entry);
        }
    }

    /// Set the quantity for a product. A quantity of zero removes the line.
    /// Unknown products are ignored.
    pub fn set_quantity(&mut self, id: &ProductId, quantity: u32) {
        if quantity == 0 {
            self.remove(id);
        } else if let Some(entry) = self.entries.iter_mut().find(|e| &e.id == id) {
            entry.quantity = quantity;
        }
    }

    /// Remove a product's line entirely.
    pub fn remove(&mut self, id: &ProductId) {
        self.entries.retain(|e| &e.id != id);
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn total_count(&self) -> u32 {
        self.entries.iter().map(|e| e.quantity).sum()
    }

    /// Total price across all lines.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.entries
            .iter()
            .map(|e| e.price * Decimal::from(e.quantity))
            .sum()
    }

    /// Whether the basket has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct product lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate over the lines in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &BasketEntry> {
        self.entries.iter()
    }
}

impl FromIterator<BasketEntry> for Basket {
    fn from_iter<I: IntoIterator<Item = BasketEntry>>(iter: I) -> Self {
        let mut basket = Self::new();
        for entry in iter {
            basket.add(entry);
        }
        basket
    }
}

impl<'a> IntoIterator for &'a Basket {
    type Item = &'a BasketEntry;
    type IntoIter = std::slice::Iter<'a, BasketEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
