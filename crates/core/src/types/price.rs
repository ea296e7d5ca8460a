//! Ticket price using decimal arithmetic.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize, Serializer};

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is not a decimal number.
    #[error("price must be a number: {0}")]
    NotANumber(String),
    /// The amount is below zero.
    #[error("price cannot be negative")]
    Negative,
}

/// Asking price of a ticket.
///
/// Held as a [`Decimal`] so amounts like `10.10` stay exact. Decodes from a
/// JSON number or numeric string; encodes as a JSON number, which is what the
/// backend stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Create a price, rejecting negative amounts.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount))
    }

    /// Parse a price as typed into a form field (e.g. `"10"`, `"12.50"`).
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a decimal or is negative.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let s = s.trim();
        let amount = Decimal::from_str(s).map_err(|_| PriceError::NotANumber(s.to_owned()))?;
        Self::new(amount)
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl From<u32> for Price {
    fn from(amount: u32) -> Self {
        Self(Decimal::from(amount))
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let normalized = self.0.normalize();
        if normalized.scale() == 0
            && let Some(whole) = normalized.to_i64()
        {
            return serializer.serialize_i64(whole);
        }
        match normalized.to_f64() {
            Some(value) => serializer.serialize_f64(value),
            None => serializer.serialize_str(&normalized.to_string()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_form_input() {
        assert_eq!(Price::parse("10").unwrap(), Price::from(10));
        assert_eq!(Price::parse(" 12.50 ").unwrap().to_string(), "12.5");
        assert_eq!(Price::parse("0").unwrap(), Price::default());
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(Price::parse("ten"), Err(PriceError::NotANumber(_))));
        assert_eq!(Price::parse("-1"), Err(PriceError::Negative));
    }

    #[test]
    fn test_decodes_number_or_string() {
        let a: Price = serde_json::from_str("10").unwrap();
        let b: Price = serde_json::from_str("\"10.25\"").unwrap();
        let c: Price = serde_json::from_str("10.25").unwrap();
        assert_eq!(a, Price::from(10));
        assert_eq!(b, c);
    }

    #[test]
    fn test_encodes_as_number() {
        assert_eq!(serde_json::to_string(&Price::from(10)).unwrap(), "10");
        assert_eq!(
            serde_json::to_string(&Price::parse("12.50").unwrap()).unwrap(),
            "12.5"
        );
    }
}
