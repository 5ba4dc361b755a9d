//! Currency normalization tests
//!
//! The stored org-currency amount is a write-time snapshot: project
//! currency override wins, matching currencies skip conversion, and a
//! failed rate lookup falls back to the native amount.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::currency::{convert, native_currency, needs_conversion};

/// The fallback rule the currency normalizer applies around the external
/// rate lookup.
fn snapshot(amount: Decimal, rate: Option<Decimal>, conversion_needed: bool) -> Decimal {
    if !conversion_needed {
        return amount;
    }
    match rate {
        Some(rate) => convert(amount, rate),
        None => amount,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_project_override_wins() {
        assert_eq!(native_currency(Some("KES"), "USD"), "KES");
    }

    #[test]
    fn test_org_currency_is_default() {
        assert_eq!(native_currency(None, "USD"), "USD");
        assert_eq!(native_currency(Some(""), "USD"), "USD");
    }

    #[test]
    fn test_case_insensitive_match_skips_conversion() {
        assert!(!needs_conversion("usd", "USD"));
        assert!(needs_conversion("KES", "USD"));
    }

    #[test]
    fn test_conversion_applies_rate() {
        let amount = Decimal::from(1000);
        let rate = Decimal::from_str("0.0077").unwrap();
        assert_eq!(convert(amount, rate), Decimal::from_str("7.70").unwrap());
    }

    #[test]
    fn test_failed_lookup_falls_back_to_native() {
        let amount = Decimal::from(50);
        assert_eq!(snapshot(amount, None, true), amount);
    }

    #[test]
    fn test_same_currency_ignores_rate() {
        let amount = Decimal::from(50);
        let rate = Some(Decimal::from(2));
        assert_eq!(snapshot(amount, rate, false), amount);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=1_000_000_000).prop_map(|n| Decimal::new(n, 2))
    }

    fn rate_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=10_000_000).prop_map(|n| Decimal::new(n, 5))
    }

    proptest! {
        /// Converted amounts carry at most two decimal places.
        #[test]
        fn prop_snapshot_is_cent_scaled(
            amount in amount_strategy(),
            rate in rate_strategy()
        ) {
            let converted = convert(amount, rate);
            prop_assert!(converted.scale() <= 2);
        }

        /// A unit rate is an identity up to cent rounding.
        #[test]
        fn prop_unit_rate_identity(amount in amount_strategy()) {
            prop_assert_eq!(convert(amount, Decimal::ONE), amount.round_dp(2));
        }

        /// The snapshot never fails: with or without a rate it produces an
        /// amount.
        #[test]
        fn prop_snapshot_total(
            amount in amount_strategy(),
            rate in proptest::option::of(rate_strategy()),
            needed in any::<bool>()
        ) {
            let result = snapshot(amount, rate, needed);
            prop_assert!(result >= Decimal::ZERO);
            if !needed || rate.is_none() {
                prop_assert_eq!(result, amount);
            }
        }
    }
}
