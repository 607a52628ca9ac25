//! Product categories and their pricing defaults.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A product category from the master inventory.
///
/// Categories arrive as free-form strings in inventory documents
/// (`"singles"`, `"sealed"`, `"accessories"`, `"prints"`, ...), so this is a
/// lenient newtype rather than a closed enum: unknown categories round-trip
/// untouched instead of failing deserialization of the whole index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    /// Create a category from anything string-like.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The singles category (loose cards).
    #[must_use]
    pub fn singles() -> Self {
        Self::new("singles")
    }

    /// Get the category name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the singles category.
    #[must_use]
    pub fn is_singles(&self) -> bool {
        self.0 == "singles"
    }

    /// Fallback price for items in this category when neither the inventory
    /// row nor the detail record carries one. Singles default to £0.50;
    /// everything else to zero.
    #[must_use]
    pub fn default_price(&self) -> Decimal {
        if self.is_singles() {
            Decimal::new(50, 2)
        } else {
            Decimal::ZERO
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Category {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singles_default_price() {
        assert_eq!(Category::singles().default_price(), Decimal::new(50, 2));
    }

    #[test]
    fn test_other_categories_default_to_zero() {
        assert_eq!(Category::new("sealed").default_price(), Decimal::ZERO);
        assert_eq!(Category::new("accessories").default_price(), Decimal::ZERO);
    }

    #[test]
    fn test_unknown_category_round_trips() {
        let cat: Category = serde_json::from_str("\"3d-prints\"").expect("deserialize");
        assert_eq!(cat.as_str(), "3d-prints");
        assert!(!cat.is_singles());
    }
}
