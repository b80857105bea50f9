//! Money helpers
//!
//! Calculations run on `Decimal`; the SQLite mirror stores `REAL`, so values
//! are converted at the repository boundary only.

use rust_decimal::prelude::*;

/// Rounding for monetary values (2 decimal places, half away from zero)
const DECIMAL_PLACES: u32 = 2;

/// Ratio precision (profit margin)
const RATIO_PLACES: u32 = 4;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    round_money(value).to_f64().unwrap_or_default()
}

/// Round to cents
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// `numerator / denominator` to 4 places; zero when the denominator is zero
pub fn ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        return Decimal::ZERO;
    }
    (numerator / denominator).round_dp_with_strategy(RATIO_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Equal within [`MONEY_TOLERANCE`]
pub fn money_eq(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() < MONEY_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_money_half_away() {
        assert_eq!(round_money(Decimal::new(12345, 3)), Decimal::new(1235, 2));
        assert_eq!(round_money(Decimal::new(-12345, 3)), Decimal::new(-1235, 2));
    }

    #[test]
    fn test_f64_boundary() {
        assert_eq!(to_f64(Decimal::new(199999, 3)), 200.0);
        assert_eq!(to_decimal(8.95), Decimal::new(895, 2));
        assert_eq!(to_decimal(f64::NAN), Decimal::ZERO);
    }

    #[test]
    fn test_ratio() {
        assert_eq!(ratio(Decimal::ONE, Decimal::from(3)), Decimal::new(3333, 4));
        assert_eq!(ratio(Decimal::ONE, Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_money_eq() {
        assert!(money_eq(Decimal::new(1000, 2), Decimal::new(10005, 3)));
        assert!(!money_eq(Decimal::new(1000, 2), Decimal::new(1001, 2)));
    }
}
