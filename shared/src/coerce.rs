//! Payload coercion for mutation requests
//!
//! Clients send numeric fields as JSON numbers, quoted strings, or null.
//! Absent and null fields fall back to zero; anything malformed (garbage
//! text, negatives, fractional quantities) is a typed error the handler
//! maps to a 400 rather than a silent zero.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A numeric payload field before coercion: JSON number or quoted string.
///
/// Wrap in `Option` on the request struct; `null` and absent both
/// deserialize to `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Int(i64),
    Float(f64),
    Text(String),
}

/// A payload field that failed coercion
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value for {field}: {message}")]
pub struct CoerceError {
    pub field: &'static str,
    pub message: String,
}

impl CoerceError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Coerce a quantity field to a non-negative integer. Absent fields are 0.
pub fn quantity(field: &'static str, raw: Option<&RawNumber>) -> Result<i32, CoerceError> {
    let Some(raw) = raw else { return Ok(0) };
    match raw {
        RawNumber::Int(n) => {
            if *n < 0 {
                Err(CoerceError::new(field, "must not be negative"))
            } else {
                i32::try_from(*n).map_err(|_| CoerceError::new(field, "out of range"))
            }
        }
        RawNumber::Float(f) => {
            if !f.is_finite() || *f < 0.0 {
                Err(CoerceError::new(field, "must be a non-negative number"))
            } else if f.fract() != 0.0 {
                Err(CoerceError::new(field, "must be a whole number"))
            } else if *f > i32::MAX as f64 {
                Err(CoerceError::new(field, "out of range"))
            } else {
                Ok(*f as i32)
            }
        }
        RawNumber::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(0);
            }
            let parsed: i64 = trimmed
                .parse()
                .map_err(|_| CoerceError::new(field, "must be a whole number"))?;
            quantity(field, Some(&RawNumber::Int(parsed)))
        }
    }
}

/// Coerce a monetary field to a non-negative decimal. Absent fields are 0.
pub fn money(field: &'static str, raw: Option<&RawNumber>) -> Result<Decimal, CoerceError> {
    let Some(raw) = raw else {
        return Ok(Decimal::ZERO);
    };
    let value = match raw {
        RawNumber::Int(n) => Decimal::from(*n),
        RawNumber::Float(f) => Decimal::try_from(*f)
            .map_err(|_| CoerceError::new(field, "must be a valid amount"))?,
        RawNumber::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(Decimal::ZERO);
            }
            Decimal::from_str(trimmed)
                .map_err(|_| CoerceError::new(field, "must be a valid amount"))?
        }
    };
    if value < Decimal::ZERO {
        Err(CoerceError::new(field, "must not be negative"))
    } else {
        Ok(value)
    }
}

/// Trim an optional string field, treating whitespace-only values as absent.
pub fn optional_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_default_to_zero() {
        assert_eq!(quantity("quantity", None).unwrap(), 0);
        assert_eq!(money("price", None).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn quoted_numbers_parse() {
        let raw = RawNumber::Text(" 12 ".to_string());
        assert_eq!(quantity("quantity", Some(&raw)).unwrap(), 12);

        let raw = RawNumber::Text("19.99".to_string());
        assert_eq!(
            money("price", Some(&raw)).unwrap(),
            Decimal::from_str("19.99").unwrap()
        );
    }

    #[test]
    fn garbage_is_rejected_not_zeroed() {
        let raw = RawNumber::Text("abc".to_string());
        assert!(quantity("quantity", Some(&raw)).is_err());
        assert!(money("price", Some(&raw)).is_err());
    }

    #[test]
    fn negative_values_are_rejected() {
        assert!(quantity("quantity", Some(&RawNumber::Int(-1))).is_err());
        assert!(money("price", Some(&RawNumber::Float(-0.5))).is_err());
    }

    #[test]
    fn fractional_quantity_is_rejected() {
        assert!(quantity("quantity", Some(&RawNumber::Float(2.5))).is_err());
    }

    #[test]
    fn empty_strings_fall_back_to_zero() {
        let raw = RawNumber::Text("   ".to_string());
        assert_eq!(quantity("quantity", Some(&raw)).unwrap(), 0);
        assert_eq!(money("price", Some(&raw)).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn customer_names_are_trimmed() {
        assert_eq!(optional_text(Some("  Acme Ltd ")), Some("Acme Ltd".to_string()));
        assert_eq!(optional_text(Some("   ")), None);
        assert_eq!(optional_text(None), None);
    }
}
