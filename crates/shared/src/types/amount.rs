//! Strictly positive monetary amount.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Every amount is a `rust_decimal::Decimal`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a raw decimal is not a usable amount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// Zero is not a movement of money.
    #[error("amount must be greater than zero")]
    Zero,
    /// Negative values are expressed through direction, never sign.
    #[error("amount must not be negative")]
    Negative,
    /// Text could not be parsed as a decimal.
    #[error("amount is not a valid decimal: {0}")]
    Malformed(String),
}

/// A strictly positive decimal amount.
///
/// Direction (credit or debit) is always carried separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Wraps a decimal, rejecting zero and negative values.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value.is_zero() {
            Err(AmountError::Zero)
        } else if value.is_sign_negative() {
            Err(AmountError::Negative)
        } else {
            Ok(Self(value))
        }
    }

    /// Parses a decimal string such as `"1500.50"`.
    pub fn parse(s: &str) -> Result<Self, AmountError> {
        let value: Decimal = s
            .trim()
            .parse()
            .map_err(|_| AmountError::Malformed(s.to_string()))?;
        Self::new(value)
    }

    /// Returns the inner decimal.
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[test]
    fn test_positive_amount_accepted() {
        let amount = Amount::new(dec!(5000)).unwrap();
        assert_eq!(amount.value(), dec!(5000));
        assert_eq!(amount.to_string(), "5000");
    }

    #[rstest]
    #[case(dec!(0), AmountError::Zero)]
    #[case(dec!(-0.01), AmountError::Negative)]
    #[case(dec!(-100), AmountError::Negative)]
    fn test_non_positive_rejected(#[case] value: Decimal, #[case] expected: AmountError) {
        assert_eq!(Amount::new(value), Err(expected));
    }

    #[test]
    fn test_parse() {
        assert_eq!(Amount::parse(" 12.50 ").unwrap().value(), dec!(12.50));
        assert!(matches!(Amount::parse("abc"), Err(AmountError::Malformed(_))));
        assert!(matches!(Amount::parse("0"), Err(AmountError::Zero)));
    }

    #[test]
    fn test_deserialize_rejects_zero() {
        let ok: Amount = serde_json::from_str("\"250\"").unwrap();
        assert_eq!(ok.value(), dec!(250));
        assert!(serde_json::from_str::<Amount>("\"0\"").is_err());
    }
}
