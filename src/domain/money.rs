//! Decimal money helpers shared by the sale orchestrator and the gateway
//! boundary. The gateway speaks integer minor units (kobo/cents); amounts
//! are stored as `BigDecimal` with two decimal places.

use bigdecimal::{BigDecimal, ToPrimitive};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("amount cannot be represented in minor units")]
    OutOfRange,
}

/// Convert a decimal major-unit amount to integer minor units,
/// `round(amount * 100)`.
pub fn to_minor_units(amount: &BigDecimal) -> Result<i64, MoneyError> {
    (amount * BigDecimal::from(100))
        .round(0)
        .to_i64()
        .ok_or(MoneyError::OutOfRange)
}

/// Partial payments must cover at least 30% of the sale total. Compared in
/// integer-scaled space so no division or rounding is involved.
pub fn meets_partial_floor(partial: &BigDecimal, total: &BigDecimal) -> bool {
    partial * BigDecimal::from(10) >= total * BigDecimal::from(3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    #[test]
    fn converts_two_decimal_amounts_exactly() {
        assert_eq!(to_minor_units(&dec("200.00")).unwrap(), 20_000);
        assert_eq!(to_minor_units(&dec("40.00")).unwrap(), 4_000);
        assert_eq!(to_minor_units(&dec("199.99")).unwrap(), 19_999);
        assert_eq!(to_minor_units(&dec("0.01")).unwrap(), 1);
    }

    #[test]
    fn rounds_sub_cent_amounts_to_nearest_minor_unit() {
        assert_eq!(to_minor_units(&dec("10.001")).unwrap(), 1_000);
        assert_eq!(to_minor_units(&dec("10.009")).unwrap(), 1_001);
    }

    #[test]
    fn partial_floor_accepts_thirty_percent_and_above() {
        let total = dec("100.00");
        assert!(meets_partial_floor(&dec("30.00"), &total));
        assert!(meets_partial_floor(&dec("40.00"), &total));
        assert!(meets_partial_floor(&dec("100.00"), &total));
    }

    #[test]
    fn partial_floor_rejects_below_thirty_percent() {
        let total = dec("100.00");
        assert!(!meets_partial_floor(&dec("29.99"), &total));
        assert!(!meets_partial_floor(&dec("10.00"), &total));
    }

    #[test]
    fn partial_floor_is_exact_on_uneven_totals() {
        // 30% of 99.99 is 29.997; 29.99 is below, 30.00 above.
        let total = dec("99.99");
        assert!(!meets_partial_floor(&dec("29.99"), &total));
        assert!(meets_partial_floor(&dec("30.00"), &total));
    }
}
