//! Daily chart series
//!
//! Buckets one window's data by local calendar day. Nothing is fetched here:
//! the caller loads orders and cost inputs once for the whole range.

use chrono::NaiveDate;
use shared::models::{CostMetrics, DailyPoint, OrderRecord, ProfitabilityOptions};
use std::collections::BTreeMap;

use crate::costs::{CostInputs, fulfillment_cost, recurring_costs};
use crate::revenue::{RevenueAccumulator, refunds_in_window, sales_set};
use crate::window::TimeWindow;

#[derive(Default)]
struct DayBucket<'a> {
    revenue: RevenueAccumulator,
    sales: Vec<&'a OrderRecord>,
}

/// One point per local calendar day of `window`, in date order
pub fn daily_series(
    window: &TimeWindow,
    orders: &[OrderRecord],
    inputs: &CostInputs,
    options: &ProfitabilityOptions,
) -> Vec<DailyPoint> {
    let mut buckets: BTreeMap<NaiveDate, DayBucket<'_>> = window
        .dates()
        .into_iter()
        .map(|d| (d, DayBucket::default()))
        .collect();

    for order in sales_set(window, orders) {
        if let Some(bucket) = buckets.get_mut(&window.local_date(order.created_at)) {
            bucket.revenue.add_sale(order);
            bucket.sales.push(order);
        }
    }
    for (_, refund) in refunds_in_window(window, orders) {
        if let Some(bucket) = buckets.get_mut(&window.local_date(refund.created_at)) {
            bucket.revenue.add_refund(refund, options.zero_total_refunds);
        }
    }

    let labels = inputs.label_costs();
    let periods = inputs.ledger_periods();

    buckets
        .into_iter()
        .map(|(date, bucket)| {
            let revenue = bucket.revenue.finish();
            let shipping = fulfillment_cost(&inputs.settings, &labels, bucket.sales);
            let [labor, rent, marketing] = recurring_costs(inputs, &periods, date, date, options);
            let costs = CostMetrics {
                labor_cost: labor.amount,
                rent: rent.amount,
                marketing: marketing.amount,
                supplies: shipping.supplies,
                fulfillment: shipping.fulfillment,
                is_labor_extrapolated: labor.extrapolated,
                is_rent_extrapolated: rent.extrapolated,
                is_marketing_extrapolated: marketing.extrapolated,
            };
            let total_expenses = costs.total();
            DailyPoint {
                date,
                net_profit: revenue.net_sales - total_expenses,
                revenue,
                costs,
                total_expenses,
            }
        })
        .collect()
}
