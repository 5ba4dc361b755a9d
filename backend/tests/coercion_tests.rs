//! Payload coercion tests
//!
//! Mutation payloads carry numbers, quoted strings, or null in their
//! numeric fields. Absent and null values default to zero; malformed
//! values are typed errors, never silent zeros.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::coerce::{money, optional_text, quantity, RawNumber};

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_missing_numeric_fields_default_to_zero() {
        assert_eq!(quantity("quantity", None).unwrap(), 0);
        assert_eq!(money("price", None).unwrap(), Decimal::ZERO);
        assert_eq!(money("cash_at_hand", None).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_integer_quantity() {
        assert_eq!(quantity("quantity", Some(&RawNumber::Int(7))).unwrap(), 7);
    }

    #[test]
    fn test_string_quantity_with_whitespace() {
        let raw = RawNumber::Text("  42 ".to_string());
        assert_eq!(quantity("quantity", Some(&raw)).unwrap(), 42);
    }

    #[test]
    fn test_whole_float_quantity() {
        assert_eq!(quantity("quantity", Some(&RawNumber::Float(3.0))).unwrap(), 3);
    }

    #[test]
    fn test_fractional_quantity_rejected() {
        let err = quantity("quantity", Some(&RawNumber::Float(3.5))).unwrap_err();
        assert_eq!(err.field, "quantity");
    }

    #[test]
    fn test_negative_quantity_rejected() {
        assert!(quantity("quantity", Some(&RawNumber::Int(-1))).is_err());
        let raw = RawNumber::Text("-4".to_string());
        assert!(quantity("quantity", Some(&raw)).is_err());
    }

    #[test]
    fn test_garbage_quantity_rejected() {
        let raw = RawNumber::Text("five".to_string());
        assert!(quantity("quantity", Some(&raw)).is_err());
    }

    #[test]
    fn test_money_from_string() {
        let raw = RawNumber::Text("1250.75".to_string());
        assert_eq!(
            money("price", Some(&raw)).unwrap(),
            Decimal::from_str("1250.75").unwrap()
        );
    }

    #[test]
    fn test_negative_money_rejected() {
        assert!(money("price", Some(&RawNumber::Int(-10))).is_err());
        let raw = RawNumber::Text("-0.01".to_string());
        assert!(money("price", Some(&raw)).is_err());
    }

    #[test]
    fn test_empty_string_is_zero() {
        let raw = RawNumber::Text(String::new());
        assert_eq!(quantity("quantity", Some(&raw)).unwrap(), 0);
        assert_eq!(money("price", Some(&raw)).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_non_finite_floats_rejected() {
        assert!(quantity("quantity", Some(&RawNumber::Float(f64::NAN))).is_err());
        assert!(quantity("quantity", Some(&RawNumber::Float(f64::INFINITY))).is_err());
    }

    #[test]
    fn test_customer_trimming() {
        assert_eq!(optional_text(Some(" Mama Njeri ")), Some("Mama Njeri".to_string()));
        assert_eq!(optional_text(Some("\t\n")), None);
        assert_eq!(optional_text(None), None);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Any non-negative integer survives coercion unchanged, whether
        /// sent as a number or a quoted string.
        #[test]
        fn prop_integer_round_trip(n in 0i32..=i32::MAX) {
            prop_assert_eq!(
                quantity("quantity", Some(&RawNumber::Int(n as i64))).unwrap(),
                n
            );
            let as_text = RawNumber::Text(n.to_string());
            prop_assert_eq!(quantity("quantity", Some(&as_text)).unwrap(), n);
        }

        /// Coercion never produces a negative quantity or amount.
        #[test]
        fn prop_never_negative(n in any::<i64>()) {
            if let Ok(q) = quantity("quantity", Some(&RawNumber::Int(n))) {
                prop_assert!(q >= 0);
            }
            if let Ok(m) = money("price", Some(&RawNumber::Int(n))) {
                prop_assert!(m >= Decimal::ZERO);
            }
        }

        /// Money strings parse to the same decimal as direct construction.
        #[test]
        fn prop_money_string_round_trip(cents in 0i64..=10_000_000_000) {
            let value = Decimal::new(cents, 2);
            let as_text = RawNumber::Text(value.to_string());
            prop_assert_eq!(money("price", Some(&as_text)).unwrap(), value);
        }

        /// Trimming is idempotent.
        #[test]
        fn prop_trim_idempotent(s in ".{0,40}") {
            let once = optional_text(Some(&s));
            let twice = optional_text(once.as_deref());
            prop_assert_eq!(once, twice);
        }
    }
}
