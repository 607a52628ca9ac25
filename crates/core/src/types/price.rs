//! Type-safe price representation using decimal arithmetic.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// A price with currency information.
///
/// Amounts are held as `Decimal` in the currency's standard unit (pounds,
/// not pence); conversion to the smallest unit happens only at the payment
/// boundary via [`Price::minor_units`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., pounds, not pence).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a GBP price, the shop's trading currency.
    #[must_use]
    pub const fn gbp(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::GBP)
    }

    /// The amount in the currency's minor unit (pence for GBP), rounded to
    /// the nearest whole unit. Payment APIs expect integer minor units.
    #[must_use]
    pub fn minor_units(&self) -> i64 {
        (self.amount * Decimal::from(100))
            .round()
            .to_i64()
            .unwrap_or(0)
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    GBP,
    USD,
    EUR,
}

impl CurrencyCode {
    /// Lowercase code as payment APIs expect it (e.g., `"gbp"`).
    #[must_use]
    pub const fn as_lowercase(self) -> &'static str {
        match self {
            Self::GBP => "gbp",
            Self::USD => "usd",
            Self::EUR => "eur",
        }
    }

    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::GBP => "£",
            Self::USD => "$",
            Self::EUR => "€",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minor_units_whole_pounds() {
        let price = Price::gbp(Decimal::new(1299, 2)); // £12.99
        assert_eq!(price.minor_units(), 1299);
    }

    #[test]
    fn test_minor_units_rounds() {
        // 0.505 pounds is 50.5 pence; banker's rounding lands on 50
        let price = Price::gbp(Decimal::new(505, 3));
        assert_eq!(price.minor_units(), 50);

        let price = Price::gbp(Decimal::new(5051, 4)); // 50.51 pence
        assert_eq!(price.minor_units(), 51);
    }

    #[test]
    fn test_currency_codes() {
        assert_eq!(CurrencyCode::GBP.as_lowercase(), "gbp");
        assert_eq!(CurrencyCode::GBP.symbol(), "£");
    }
}
