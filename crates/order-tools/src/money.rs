//! Monetary amounts as two-fraction-digit decimal strings.

use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;
use std::str::FromStr as _;

/// Parse an upstream amount (`"18.99"`, `18.99`, `"0"`), `None` when absent or unparseable.
#[must_use]
pub fn parse_amount(value: Option<&Value>) -> Option<Decimal> {
    let raw = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if raw.is_empty() {
        return None;
    }
    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .ok()
}

/// Render an amount with exactly two fraction digits, rounding half away from zero.
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let rounded = if rounded.is_zero() {
        Decimal::ZERO
    } else {
        rounded
    };
    format!("{rounded:.2}")
}

/// Parse-and-format shortcut; absent or malformed input renders as `"0.00"`.
#[must_use]
pub fn amount_or_zero(value: Option<&Value>) -> String {
    format_amount(parse_amount(value).unwrap_or(Decimal::ZERO))
}

/// Sum every parseable amount; malformed entries count as zero. `None` on overflow.
pub fn sum_amounts<'a, I>(values: I) -> Option<Decimal>
where
    I: IntoIterator<Item = Option<&'a Value>>,
{
    values
        .into_iter()
        .filter_map(parse_amount)
        .try_fold(Decimal::ZERO, Decimal::checked_add)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fmt(v: Value) -> String {
        amount_or_zero(Some(&v))
    }

    #[test]
    fn formats_strings_and_numbers_with_two_digits() {
        assert_eq!(fmt(json!("399.00")), "399.00");
        assert_eq!(fmt(json!("18.9")), "18.90");
        assert_eq!(fmt(json!(5)), "5.00");
        assert_eq!(fmt(json!(12.345)), "12.35");
        assert_eq!(fmt(json!("-3.1")), "-3.10");
        assert_eq!(fmt(json!("1e2")), "100.00");
    }

    #[test]
    fn missing_or_garbage_is_zero() {
        assert_eq!(amount_or_zero(None), "0.00");
        assert_eq!(fmt(json!("")), "0.00");
        assert_eq!(fmt(json!("abc")), "0.00");
        assert_eq!(fmt(json!({"amount": 1})), "0.00");
        assert_eq!(fmt(json!("-0.001")), "0.00");
    }

    #[test]
    fn sums_ignore_unparseable_entries() {
        let a = json!("10.10");
        let b = json!(2.5);
        let c = json!("n/a");
        let total = sum_amounts([Some(&a), Some(&b), Some(&c), None]).expect("sum");
        assert_eq!(format_amount(total), "12.60");
    }

    #[test]
    fn sum_overflow_is_none() {
        let max = json!(Decimal::MAX.to_string());
        assert_eq!(sum_amounts([Some(&max), Some(&max)]), None);
        assert_eq!(sum_amounts([Some(&max)]), Some(Decimal::MAX));
    }
}
