//! Currency resolution and conversion math
//!
//! A sale is recorded in its project's currency when the project overrides
//! one, otherwise in the organization's base currency. The stored
//! `amount_org_ccy` is a conversion snapshot taken at write time, never
//! recomputed later.

use rust_decimal::Decimal;

/// Decimal places kept on converted amounts
const ORG_AMOUNT_SCALE: u32 = 2;

/// Resolve the currency a sale amount is denominated in.
pub fn native_currency<'a>(project_override: Option<&'a str>, org_currency: &'a str) -> &'a str {
    match project_override {
        Some(code) if !code.trim().is_empty() => code,
        _ => org_currency,
    }
}

/// Whether a conversion is needed at all.
pub fn needs_conversion(native: &str, org_currency: &str) -> bool {
    !native.eq_ignore_ascii_case(org_currency)
}

/// Apply an exchange rate to a native amount.
pub fn convert(amount: Decimal, rate: Decimal) -> Decimal {
    (amount * rate).round_dp(ORG_AMOUNT_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn project_override_wins() {
        assert_eq!(native_currency(Some("KES"), "USD"), "KES");
        assert_eq!(native_currency(None, "USD"), "USD");
        assert_eq!(native_currency(Some("  "), "USD"), "USD");
    }

    #[test]
    fn same_currency_needs_no_conversion() {
        assert!(!needs_conversion("usd", "USD"));
        assert!(needs_conversion("KES", "USD"));
    }

    #[test]
    fn conversion_rounds_to_cents() {
        let amount = Decimal::from(50);
        let rate = Decimal::from_str("0.00774").unwrap();
        assert_eq!(convert(amount, rate), Decimal::from_str("0.39").unwrap());
    }
}
