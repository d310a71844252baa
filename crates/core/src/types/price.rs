//! Service price using decimal arithmetic.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`] from form input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is not a decimal number.
    #[error("price must be a number")]
    NotANumber,
    /// The input is below zero.
    #[error("price cannot be negative")]
    Negative,
}

/// Price of a clinic service in the clinic's currency.
///
/// Serialized as a decimal string (`"45.00"`) so no precision is lost on the
/// way to or from the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Create a price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// The raw decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Parse a price typed into a form (`"45"`, `"45.5"`, `"$45.50"`).
    ///
    /// # Errors
    ///
    /// Returns [`PriceError`] if the input is not a non-negative number.
    pub fn parse(input: &str) -> Result<Self, PriceError> {
        let cleaned = input.trim().trim_start_matches('$').replace(',', "");
        let amount = Decimal::from_str(&cleaned).map_err(|_| PriceError::NotANumber)?;
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount.round_dp(2)))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        assert_eq!(Price::parse("45").unwrap().to_string(), "$45.00");
        assert_eq!(Price::parse(" $1,250.5 ").unwrap().to_string(), "$1250.50");
        assert_eq!(Price::parse("0").unwrap(), Price::default());
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(Price::parse("free"), Err(PriceError::NotANumber));
        assert_eq!(Price::parse("-3"), Err(PriceError::Negative));
    }

    #[test]
    fn test_serializes_as_string() {
        let price = Price::parse("19.99").unwrap();
        assert_eq!(serde_json::to_string(&price).unwrap(), "\"19.99\"");
    }
}
