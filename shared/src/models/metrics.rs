//! Revenue / cost / profitability metrics

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Canonical revenue metrics for a window
///
/// - `net_sales = gross_sales − discounts − returns`
/// - `total_sales = net_sales + shipping_charges + taxes − return_fees`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RevenueMetrics {
    pub gross_sales: Decimal,
    pub discounts: Decimal,
    pub returns: Decimal,
    pub net_sales: Decimal,
    pub shipping_charges: Decimal,
    pub return_fees: Decimal,
    pub taxes: Decimal,
    pub total_sales: Decimal,
}

impl RevenueMetrics {
    /// Field name / value pairs, in report order
    pub fn fields(&self) -> [(&'static str, Decimal); 8] {
        [
            ("gross_sales", self.gross_sales),
            ("discounts", self.discounts),
            ("returns", self.returns),
            ("net_sales", self.net_sales),
            ("shipping_charges", self.shipping_charges),
            ("return_fees", self.return_fees),
            ("taxes", self.taxes),
            ("total_sales", self.total_sales),
        ]
    }
}

/// Operating costs for a window
///
/// `is_*_extrapolated` marks values prorated from a longer billing period
/// rather than measured for the window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostMetrics {
    pub labor_cost: Decimal,
    pub rent: Decimal,
    pub marketing: Decimal,
    pub supplies: Decimal,
    pub fulfillment: Decimal,
    pub is_labor_extrapolated: bool,
    pub is_rent_extrapolated: bool,
    pub is_marketing_extrapolated: bool,
}

impl CostMetrics {
    pub fn total(&self) -> Decimal {
        self.fulfillment + self.labor_cost + self.rent + self.marketing + self.supplies
    }
}

/// How refunds with a zero total but non-zero line-item subtotal count toward returns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZeroTotalRefundPolicy {
    /// Line-item subtotals count toward returns
    #[default]
    Include,
    /// The refund is ignored for returns, shipping and taxes
    Exclude,
}

/// Per-call calculation options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitabilityOptions {
    /// Labor from the cost ledger (true) or prorated from settings (false)
    #[serde(default)]
    pub use_historical_payroll: bool,
    #[serde(default)]
    pub zero_total_refunds: ZeroTotalRefundPolicy,
}

/// Resolved window as reported back to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportWindow {
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub time_zone: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: i64,
}

/// Non-fatal observations gathered during one calculation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculationDiagnostics {
    pub created_matches: usize,
    pub modified_matches: usize,
    pub merged_orders: usize,
    pub duplicates_collapsed: usize,
    /// Batch detail entries that came back null
    pub skipped_missing: usize,
    /// Batch detail entries of another record type
    pub skipped_wrong_type: usize,
    /// Order entries that could not be decoded
    pub skipped_malformed: usize,
    /// A predicate run hit the page ceiling
    pub pagination_truncated: bool,
    /// A list run or detail batch failed; figures cover only what was fetched
    pub upstream_incomplete: bool,
    pub warnings: Vec<String>,
    pub possibly_truncated_orders: Vec<String>,
    pub orders_without_shipping: Vec<String>,
    pub zero_total_refunds: usize,
}

impl CalculationDiagnostics {
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

/// Full profitability report, created fresh per request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitabilityReport {
    pub window: ReportWindow,
    pub revenue: RevenueMetrics,
    pub costs: CostMetrics,
    pub total_expenses: Decimal,
    pub net_profit: Decimal,
    /// `net_profit / net_sales`, 4 decimal places
    pub profit_margin: Decimal,
    pub diagnostics: CalculationDiagnostics,
}

/// One calendar day of the daily chart series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub revenue: RevenueMetrics,
    pub costs: CostMetrics,
    pub total_expenses: Decimal,
    pub net_profit: Decimal,
}
