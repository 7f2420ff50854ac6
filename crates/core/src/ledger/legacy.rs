//! Amount recovery for imported rows that only kept a description.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

/// `<quantity> x <item> @ <unit price>`, e.g. `10 x bags @ 200`.
static QUANTITY_AT_PRICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*[xX×]\s*[^@]*@\s*(\d+(?:\.\d+)?)")
        .expect("quantity-at-price pattern is a valid regex")
});

/// Parses `quantity x item @ price` and returns `quantity × price`.
#[must_use]
pub fn parse_quantity_price(description: &str) -> Option<Decimal> {
    let caps = QUANTITY_AT_PRICE.captures(description)?;
    let quantity: Decimal = caps.get(1)?.as_str().parse().ok()?;
    let price: Decimal = caps.get(2)?.as_str().parse().ok()?;
    let total = quantity.checked_mul(price)?;
    (total > Decimal::ZERO).then_some(total)
}

/// Explicit positive amount first, then the parsed description, else zero.
#[must_use]
pub fn resolve_legacy_amount(amount: Option<Decimal>, description: &str) -> Decimal {
    amount
        .filter(|a| *a > Decimal::ZERO)
        .or_else(|| parse_quantity_price(description))
        .unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case("10 x item @ 200", Some(dec!(2000)))]
    #[case("2.5X cement bags@ 40", Some(dec!(100)))]
    #[case("sold 3 × rice @ 12.50 to Karim", Some(dec!(37.50)))]
    #[case("0 x item @ 200", None)]
    #[case("paid in full", None)]
    #[case("10 items at 200", None)]
    fn test_parse_quantity_price(#[case] description: &str, #[case] expected: Option<Decimal>) {
        assert_eq!(parse_quantity_price(description), expected);
    }

    #[test]
    fn test_pattern_compiles_with_two_groups() {
        assert_eq!(QUANTITY_AT_PRICE.captures_len(), 3);
        assert!(QUANTITY_AT_PRICE.is_match("10 x item @ 200"));
    }

    #[test]
    fn test_explicit_amount_wins() {
        assert_eq!(resolve_legacy_amount(Some(dec!(75)), "10 x item @ 200"), dec!(75));
    }

    #[test]
    fn test_falls_back_to_description_then_zero() {
        assert_eq!(resolve_legacy_amount(None, "4 x pens @ 5"), dec!(20));
        assert_eq!(resolve_legacy_amount(Some(dec!(0)), "4 x pens @ 5"), dec!(20));
        assert_eq!(resolve_legacy_amount(None, "opening adjustment"), Decimal::ZERO);
    }
}
