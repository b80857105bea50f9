//! Benchmark validator
//!
//! Compares computed revenue with an externally published report, field by
//! field, with an absolute tolerance.

use rust_decimal::Decimal;
use serde::Serialize;
use shared::models::RevenueMetrics;

/// Allowed absolute deviation per field ($50)
pub const BENCHMARK_TOLERANCE: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// Reference week start (local date)
pub const REFERENCE_WEEK_START: &str = "2026-01-26";
/// Reference week end (local date, inclusive)
pub const REFERENCE_WEEK_END: &str = "2026-02-01";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDeviation {
    pub field: &'static str,
    pub computed: Decimal,
    pub expected: Decimal,
    pub deviation: Decimal,
    pub within_tolerance: bool,
}

/// Published analytics figures for 2026-01-26 – 2026-02-01
pub fn reference_week() -> RevenueMetrics {
    RevenueMetrics {
        gross_sales: Decimal::new(1529442, 2),
        discounts: Decimal::new(220054, 2),
        returns: Decimal::new(99444, 2),
        net_sales: Decimal::new(1209944, 2),
        shipping_charges: Decimal::new(40386, 2),
        return_fees: Decimal::ZERO,
        taxes: Decimal::new(19990, 2),
        total_sales: Decimal::new(1270320, 2),
    }
}

/// Deviation of every revenue field
pub fn compare(
    computed: &RevenueMetrics,
    expected: &RevenueMetrics,
    tolerance: Decimal,
) -> Vec<FieldDeviation> {
    computed
        .fields()
        .into_iter()
        .zip(expected.fields())
        .map(|((field, computed), (_, expected))| {
            let deviation = (computed - expected).abs();
            FieldDeviation {
                field,
                computed,
                expected,
                deviation,
                within_tolerance: deviation <= tolerance,
            }
        })
        .collect()
}

pub fn all_within_tolerance(deviations: &[FieldDeviation]) -> bool {
    deviations.iter().all(|d| d.within_tolerance)
}

/// Plain-text table for terminal output
pub fn render_table(deviations: &[FieldDeviation]) -> String {
    let mut out = format!(
        "{:<18} {:>14} {:>14} {:>12}  {}\n",
        "field", "computed", "expected", "deviation", "ok"
    );
    for d in deviations {
        out.push_str(&format!(
            "{:<18} {:>14} {:>14} {:>12}  {}\n",
            d.field,
            d.computed.round_dp(2),
            d.expected.round_dp(2),
            d.deviation.round_dp(2),
            if d.within_tolerance { "yes" } else { "NO" }
        ));
    }
    out
}
