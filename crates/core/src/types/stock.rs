//! Non-negative stock counts.

use serde::{Deserialize, Serialize};

/// An on-hand stock count.
///
/// Stock is unsigned by construction and every mutation saturates at zero,
/// so a negative count is unrepresentable no matter what deltas the webhook
/// or admin paths apply.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Stock(u32);

impl Stock {
    /// Zero stock.
    pub const ZERO: Self = Self(0);

    /// Create a stock count.
    #[must_use]
    pub const fn new(count: u32) -> Self {
        Self(count)
    }

    /// Get the underlying count.
    #[must_use]
    pub const fn count(self) -> u32 {
        self.0
    }

    /// Whether any units are available for sale.
    #[must_use]
    pub const fn is_available(self) -> bool {
        self.0 > 0
    }

    /// Whether the count is zero.
    #[must_use]
    pub const fn is_depleted(self) -> bool {
        self.0 == 0
    }

    /// Apply a signed delta, clamping at zero.
    ///
    /// A delta that would take the count negative yields zero instead.
    #[must_use]
    pub fn adjust(self, delta: i64) -> Self {
        let adjusted = i64::from(self.0).saturating_add(delta).max(0);
        Self(u32::try_from(adjusted).unwrap_or(u32::MAX))
    }

    /// Whether at least `quantity` units are on hand.
    #[must_use]
    pub const fn covers(self, quantity: u32) -> bool {
        self.0 >= quantity
    }
}

impl std::fmt::Display for Stock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Stock {
    fn from(count: u32) -> Self {
        Self(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjust_applies_delta() {
        assert_eq!(Stock::new(5).adjust(-2), Stock::new(3));
        assert_eq!(Stock::new(5).adjust(3), Stock::new(8));
    }

    #[test]
    fn test_adjust_clamps_at_zero() {
        assert_eq!(Stock::new(1).adjust(-3), Stock::ZERO);
        assert_eq!(Stock::ZERO.adjust(-1), Stock::ZERO);
    }

    #[test]
    fn test_adjust_zero_delta_is_identity() {
        assert_eq!(Stock::new(7).adjust(0), Stock::new(7));
    }

    #[test]
    fn test_covers() {
        assert!(Stock::new(3).covers(3));
        assert!(Stock::new(3).covers(1));
        assert!(!Stock::new(3).covers(4));
        assert!(!Stock::ZERO.covers(1));
    }

    #[test]
    fn test_availability() {
        assert!(Stock::new(1).is_available());
        assert!(!Stock::ZERO.is_available());
        assert!(Stock::ZERO.is_depleted());
    }
}
