//! Tolerant serde adapters for the ingestion job's JSON output
//!
//! The spreadsheet export is not strict about types: numbers can arrive as
//! strings, `null`, or be missing altogether, and dates use the sentinel
//! `"No aplica"` when they do not apply. Missing or malformed numbers become 0.
//! Quantities are read from their literal text so they stay exact decimals.

use std::str::FromStr;

use chrono::NaiveDate;
use indexmap::IndexMap;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;

/// Sentinel written in place of a date that does not apply
pub const NOT_APPLICABLE: &str = "No aplica";

/// Parse a plain or scientific decimal literal
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

fn decimal_from_value(value: &Value) -> Decimal {
    let parsed = match value {
        // Going through the literal keeps 0.1 as 0.1 instead of its binary expansion
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(&s.trim().replace(',', ".")),
        _ => None,
    };
    parsed.unwrap_or(Decimal::ZERO)
}

/// Deserialize any JSON value into a `Decimal`, degrading to 0
pub fn lenient_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(decimal_from_value).unwrap_or_default())
}

/// Deserialize a day count, degrading negatives and garbage to 0
pub fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = lenient_decimal(deserializer)?;
    if value <= Decimal::ZERO {
        Ok(0)
    } else {
        Ok(value.round().to_u32().unwrap_or(u32::MAX))
    }
}

/// Deserialize a whole count (boxes), degrading negatives and garbage to 0
pub fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = lenient_decimal(deserializer)?;
    if value <= Decimal::ZERO {
        Ok(0)
    } else {
        Ok(value.round().to_u64().unwrap_or(u64::MAX))
    }
}

/// Deserialize a label → quantity map, keeping insertion order
pub fn lenient_series<'de, D>(deserializer: D) -> Result<IndexMap<String, Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<IndexMap<String, Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(label, value)| (label, decimal_from_value(&value)))
        .collect())
}

/// `Option<NaiveDate>` stored as `YYYY-MM-DD` or [`NOT_APPLICABLE`]
pub mod date_or_not_applicable {
    use super::*;

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_str(NOT_APPLICABLE),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Value>::deserialize(deserializer)?;
        Ok(match raw {
            Some(Value::String(s)) => parse_date(&s),
            _ => None,
        })
    }

    fn parse_date(raw: &str) -> Option<NaiveDate> {
        let trimmed = raw.trim();
        // Timestamps like 2025-02-14T00:00:00 keep only the date part
        let date_part = trimmed.get(..10).unwrap_or(trimmed);
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "lenient_decimal")]
        amount: Decimal,
        #[serde(default, deserialize_with = "lenient_u32")]
        days: u32,
        #[serde(default, with = "date_or_not_applicable")]
        date: Option<NaiveDate>,
    }

    #[test]
    fn test_numbers_from_strings_and_nulls() {
        let sample: Sample =
            serde_json::from_str(r#"{"amount": "12,5", "days": null, "date": "No aplica"}"#)
                .unwrap();
        assert_eq!(sample.amount, Decimal::new(125, 1));
        assert_eq!(sample.days, 0);
        assert_eq!(sample.date, None);
    }

    #[test]
    fn test_missing_fields_default_to_zero() {
        let sample: Sample = serde_json::from_str("{}").unwrap();
        assert_eq!(sample.amount, Decimal::ZERO);
        assert_eq!(sample.days, 0);
        assert!(sample.date.is_none());
    }

    #[test]
    fn test_garbage_number_is_zero() {
        let sample: Sample =
            serde_json::from_str(r#"{"amount": "Sin información", "days": -4}"#).unwrap();
        assert_eq!(sample.amount, Decimal::ZERO);
        assert_eq!(sample.days, 0);
    }

    #[test]
    fn test_float_literals_stay_exact() {
        let sample: Sample = serde_json::from_str(r#"{"amount": 0.1, "days": 7.6}"#).unwrap();
        assert_eq!(sample.amount, Decimal::new(1, 1));
        assert_eq!(sample.days, 8);
        assert_eq!(parse_decimal("2.5e3"), Some(Decimal::from(2500)));
    }

    #[test]
    fn test_timestamp_date_is_truncated() {
        let sample: Sample = serde_json::from_str(r#"{"date": "2025-02-14T00:00:00"}"#).unwrap();
        assert_eq!(sample.date, NaiveDate::from_ymd_opt(2025, 2, 14));
    }
}
