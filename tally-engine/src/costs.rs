//! Cost aggregator
//!
//! Fulfillment and supplies follow the sales set. Recurring costs (labor,
//! rent, marketing) use ledger actuals when a recorded period lies inside the
//! window and a per-day prorated rate otherwise.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use shared::models::{
    CostCategory, CostMetrics, CostSettings, LedgerEntry, OrderRecord, ProfitabilityOptions,
    Shipment,
};
use sqlx::SqlitePool;
use std::collections::HashMap;

use crate::money::{round_money, to_decimal};
use crate::store::{self, RepoResult};

/// Everything the aggregator reads from the local store, loaded once per call
#[derive(Debug, Clone, Default)]
pub struct CostInputs {
    pub settings: CostSettings,
    pub shipments: Vec<Shipment>,
    pub ledger: Vec<LedgerEntry>,
}

impl CostInputs {
    pub async fn load(
        pool: &SqlitePool,
        order_ids: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepoResult<Self> {
        let settings = store::cost_settings::load(pool).await?;
        let shipments = store::shipments::find_purchased_for_orders(pool, order_ids).await?;
        let ledger = store::ledger::find_overlapping(pool, start, end).await?;
        tracing::debug!(
            shipments = shipments.len(),
            ledger_entries = ledger.len(),
            "Cost inputs loaded"
        );
        Ok(Self {
            settings,
            shipments,
            ledger,
        })
    }

    /// Label cost per order over purchased, unrefunded shipments
    pub fn label_costs(&self) -> HashMap<&str, Decimal> {
        let mut costs: HashMap<&str, Decimal> = HashMap::new();
        for s in self.shipments.iter().filter(|s| s.purchased && !s.refunded) {
            *costs.entry(s.order_id.as_str()).or_default() += to_decimal(s.label_cost);
        }
        costs
    }

    /// Ledger rows with a known category and valid period
    pub fn ledger_periods(&self) -> Vec<LedgerPeriod> {
        self.ledger
            .iter()
            .filter_map(|entry| {
                let period = LedgerPeriod::from_entry(entry);
                if period.is_none() {
                    tracing::warn!(entry_id = entry.id, "Skipping malformed ledger entry");
                }
                period
            })
            .collect()
    }
}

/// Parsed ledger row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedgerPeriod {
    pub category: CostCategory,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub amount: Decimal,
}

impl LedgerPeriod {
    fn from_entry(entry: &LedgerEntry) -> Option<Self> {
        let category = CostCategory::parse(&entry.category)?;
        let start = NaiveDate::parse_from_str(&entry.period_start, "%Y-%m-%d").ok()?;
        let end = NaiveDate::parse_from_str(&entry.period_end, "%Y-%m-%d").ok()?;
        (start <= end).then(|| Self {
            category,
            start,
            end,
            amount: to_decimal(entry.amount),
        })
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    fn within(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start >= start && self.end <= end
    }

    fn daily_rate(&self) -> Decimal {
        self.amount / Decimal::from(self.days())
    }
}

/// Days in the calendar month containing `date`
pub fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = (date.year(), date.month());
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    match (next, NaiveDate::from_ymd_opt(year, month, 1)) {
        (Some(next), Some(first)) => (next - first).num_days() as u32,
        _ => 30,
    }
}

/// One day's share of a monthly amount
fn prorate_monthly(monthly: Decimal, date: NaiveDate) -> Decimal {
    monthly / Decimal::from(days_in_month(date))
}

/// One recurring category over a date range
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RecurringCost {
    pub amount: Decimal,
    pub extrapolated: bool,
}

/// Measured actuals where a ledger period lies inside `start..=end`, else the
/// covering entry's daily rate, else the configured monthly amount per day.
pub fn recurring_cost(
    category: CostCategory,
    periods: &[LedgerPeriod],
    monthly: Decimal,
    start: NaiveDate,
    end: NaiveDate,
) -> RecurringCost {
    let mine: Vec<&LedgerPeriod> = periods.iter().filter(|p| p.category == category).collect();
    let (actuals, partial): (Vec<&LedgerPeriod>, Vec<&LedgerPeriod>) =
        mine.into_iter().partition(|p| p.within(start, end));

    let mut cost = RecurringCost {
        amount: actuals.iter().map(|p| p.amount).sum(),
        extrapolated: false,
    };

    for date in start.iter_days().take_while(|d| *d <= end) {
        if actuals.iter().any(|p| p.covers(date)) {
            continue;
        }
        cost.extrapolated = true;
        cost.amount += match partial.iter().find(|p| p.covers(date)) {
            Some(period) => period.daily_rate(),
            None => prorate_monthly(monthly, date),
        };
    }

    cost.amount = round_money(cost.amount);
    cost
}

/// Configured monthly amount spread over every day of `start..=end`
pub fn prorated_cost(monthly: Decimal, start: NaiveDate, end: NaiveDate) -> RecurringCost {
    let amount = start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(|d| prorate_monthly(monthly, d))
        .sum();
    RecurringCost {
        amount: round_money(amount),
        extrapolated: true,
    }
}

/// Labor, rent and marketing for a date range
pub fn recurring_costs(
    inputs: &CostInputs,
    periods: &[LedgerPeriod],
    start: NaiveDate,
    end: NaiveDate,
    options: &ProfitabilityOptions,
) -> [RecurringCost; 3] {
    let settings = &inputs.settings;
    let labor = if options.use_historical_payroll {
        recurring_cost(CostCategory::Labor, periods, settings.monthly_labor, start, end)
    } else {
        prorated_cost(settings.monthly_labor, start, end)
    };
    let rent = recurring_cost(CostCategory::Rent, periods, settings.monthly_rent, start, end);
    let marketing = recurring_cost(
        CostCategory::Marketing,
        periods,
        settings.monthly_marketing,
        start,
        end,
    );
    [labor, rent, marketing]
}

/// Label-driven costs for a set of orders
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FulfillmentCost {
    pub fulfillment: Decimal,
    pub supplies: Decimal,
    pub fulfilled_orders: usize,
    pub orders_without_shipping: Vec<String>,
}

pub fn fulfillment_cost<'a>(
    settings: &CostSettings,
    label_costs: &HashMap<&str, Decimal>,
    orders: impl IntoIterator<Item = &'a OrderRecord>,
) -> FulfillmentCost {
    let mut out = FulfillmentCost::default();
    let (mut items, mut designs) = (0i64, 0i64);

    for order in orders {
        match label_costs.get(order.id.as_str()) {
            Some(cost) => {
                out.fulfillment += *cost;
                out.fulfilled_orders += 1;
                items += order.item_count();
                designs += order.design_count();
            }
            None => out.orders_without_shipping.push(order.id.clone()),
        }
    }

    out.fulfillment = round_money(out.fulfillment);
    out.supplies = round_money(
        Decimal::from(items) * settings.supply_cost_per_item
            + Decimal::from(out.fulfilled_orders as i64) * settings.bag_cost_per_order
            + Decimal::from(designs) * settings.ink_cost_per_design,
    );
    out
}

/// Cost metrics plus the sales-set orders that had no label
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CostBreakdown {
    pub metrics: CostMetrics,
    pub orders_without_shipping: Vec<String>,
}

/// Costs for the sales set over `start..=end` (local dates)
pub fn aggregate_costs(
    inputs: &CostInputs,
    sales_orders: &[&OrderRecord],
    start: NaiveDate,
    end: NaiveDate,
    options: &ProfitabilityOptions,
) -> CostBreakdown {
    let labels = inputs.label_costs();
    let shipping = fulfillment_cost(&inputs.settings, &labels, sales_orders.iter().copied());
    let periods = inputs.ledger_periods();
    let [labor, rent, marketing] = recurring_costs(inputs, &periods, start, end, options);

    if !shipping.orders_without_shipping.is_empty() {
        tracing::info!(
            count = shipping.orders_without_shipping.len(),
            "Sales-set orders without a purchased label"
        );
    }

    CostBreakdown {
        metrics: CostMetrics {
            labor_cost: labor.amount,
            rent: rent.amount,
            marketing: marketing.amount,
            supplies: shipping.supplies,
            fulfillment: shipping.fulfillment,
            is_labor_extrapolated: labor.extrapolated,
            is_rent_extrapolated: rent.extrapolated,
            is_marketing_extrapolated: marketing.extrapolated,
        },
        orders_without_shipping: shipping.orders_without_shipping,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use shared::models::LineItem;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn period(category: CostCategory, start: &str, end: &str, amount: &str) -> LedgerPeriod {
        LedgerPeriod {
            category,
            start: date(start),
            end: date(end),
            amount: dec(amount),
        }
    }

    fn order(id: &str, quantities: &[(i64, bool)]) -> OrderRecord {
        let ts = Utc.with_ymd_and_hms(2026, 1, 27, 15, 0, 0).unwrap();
        OrderRecord {
            id: id.into(),
            name: None,
            created_at: ts,
            updated_at: ts,
            line_items: quantities
                .iter()
                .map(|(q, design)| LineItem {
                    quantity: *q,
                    original_unit_price: dec("10"),
                    original_total: dec("10") * Decimal::from(*q),
                    discounted_total: dec("10") * Decimal::from(*q),
                    sku: None,
                    design_id: design.then(|| "dsn-1".to_string()),
                })
                .collect(),
            line_items_truncated: false,
            refunds: vec![],
            shipping_charge: Decimal::ZERO,
            tax_total: Decimal::ZERO,
            discount_total: Decimal::ZERO,
        }
    }

    fn shipment(order_id: &str, cost: f64, refunded: bool) -> Shipment {
        Shipment {
            id: 0,
            order_id: order_id.into(),
            carrier: None,
            service: None,
            tracking_number: None,
            label_cost: cost,
            purchased: true,
            refunded,
            created_at: 0,
        }
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(date("2026-01-15")), 31);
        assert_eq!(days_in_month(date("2026-02-01")), 28);
        assert_eq!(days_in_month(date("2028-02-10")), 29);
        assert_eq!(days_in_month(date("2026-12-31")), 31);
    }

    #[test]
    fn test_contained_entry_is_actual() {
        let periods = [period(CostCategory::Labor, "2026-01-26", "2026-02-01", "4200.00")];
        let cost = recurring_cost(
            CostCategory::Labor,
            &periods,
            dec("9000"),
            date("2026-01-26"),
            date("2026-02-01"),
        );
        assert_eq!(cost.amount, dec("4200.00"));
        assert!(!cost.extrapolated);
    }

    #[test]
    fn test_monthly_entry_prorated_over_week() {
        // January rent over the last 6 days of January, February falls back to settings
        let periods = [period(CostCategory::Rent, "2026-01-01", "2026-01-31", "3100.00")];
        let cost = recurring_cost(
            CostCategory::Rent,
            &periods,
            dec("2800"),
            date("2026-01-26"),
            date("2026-02-01"),
        );
        // 6 × 100 + 1 × 100
        assert_eq!(cost.amount, dec("700.00"));
        assert!(cost.extrapolated);
    }

    #[test]
    fn test_no_ledger_uses_settings() {
        let cost = recurring_cost(
            CostCategory::Marketing,
            &[],
            dec("3100"),
            date("2026-01-01"),
            date("2026-01-10"),
        );
        assert_eq!(cost.amount, dec("1000.00"));
        assert!(cost.extrapolated);

        let zero = recurring_cost(
            CostCategory::Marketing,
            &[],
            Decimal::ZERO,
            date("2026-01-01"),
            date("2026-01-10"),
        );
        assert_eq!(zero.amount, Decimal::ZERO);
    }

    #[test]
    fn test_labor_without_historical_payroll_ignores_ledger() {
        let inputs = CostInputs {
            settings: CostSettings {
                monthly_labor: dec("3100"),
                ..Default::default()
            },
            ..Default::default()
        };
        let periods = [period(CostCategory::Labor, "2026-01-05", "2026-01-11", "5000.00")];
        let start = date("2026-01-05");
        let end = date("2026-01-11");

        let [labor, ..] =
            recurring_costs(&inputs, &periods, start, end, &ProfitabilityOptions::default());
        assert_eq!(labor.amount, dec("700.00"));
        assert!(labor.extrapolated);

        let options = ProfitabilityOptions {
            use_historical_payroll: true,
            ..Default::default()
        };
        let [labor, ..] = recurring_costs(&inputs, &periods, start, end, &options);
        assert_eq!(labor.amount, dec("5000.00"));
        assert!(!labor.extrapolated);
    }

    #[test]
    fn test_fulfillment_and_supplies() {
        let inputs = CostInputs {
            shipments: vec![
                shipment("a", 8.12, false),
                shipment("a", 1.00, false),
                shipment("b", 6.00, true),
            ],
            ..Default::default()
        };
        let a = order("a", &[(3, true), (2, false)]);
        let b = order("b", &[(1, false)]);
        let sales = [&a, &b];

        let out = aggregate_costs(
            &inputs,
            &sales,
            date("2026-01-27"),
            date("2026-01-27"),
            &ProfitabilityOptions::default(),
        );
        assert_eq!(out.metrics.fulfillment, dec("9.12"));
        // 5 items × 0.50 + 1 order × 0.25 + 3 designs × 0.15
        assert_eq!(out.metrics.supplies, dec("3.20"));
        assert_eq!(out.orders_without_shipping, vec!["b"]);
        assert_eq!(out.metrics.rent, Decimal::ZERO);
    }

    #[test]
    fn test_malformed_ledger_rows_skipped() {
        let inputs = CostInputs {
            ledger: vec![LedgerEntry {
                id: 1,
                category: "utilities".into(),
                period_start: "2026-01-01".into(),
                period_end: "2026-01-31".into(),
                amount: 10.0,
                note: None,
            }],
            ..Default::default()
        };
        assert!(inputs.ledger_periods().is_empty());
    }
}
