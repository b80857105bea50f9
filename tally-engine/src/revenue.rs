//! Revenue calculator
//!
//! Sales are attributed by order creation date, refunds by refund date. An
//! order created last month with a refund inside the window contributes its
//! refund here and its sale there.

use rust_decimal::Decimal;
use shared::models::{OrderRecord, RefundRecord, RevenueMetrics, ZeroTotalRefundPolicy};
use std::collections::BTreeSet;

use crate::money::round_money;
use crate::window::TimeWindow;

/// Running sums for one bucket (a window or a single day)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RevenueAccumulator {
    gross_sales: Decimal,
    discounts: Decimal,
    returns: Decimal,
    shipping_charged: Decimal,
    shipping_refunded: Decimal,
    tax_charged: Decimal,
    tax_refunded: Decimal,
    return_fees: Decimal,
}

impl RevenueAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count an order of the sales set
    pub fn add_sale(&mut self, order: &OrderRecord) {
        self.gross_sales += order.gross_sales();
        self.discounts += order.discount_total;
        self.shipping_charged += order.shipping_charge;
        self.tax_charged += order.tax_total;
    }

    /// Count an in-window refund; returns `false` when the policy skips it
    pub fn add_refund(&mut self, refund: &RefundRecord, policy: ZeroTotalRefundPolicy) -> bool {
        if refund.is_zero_total() && policy == ZeroTotalRefundPolicy::Exclude {
            return false;
        }
        self.returns += refund.returned_amount();
        self.shipping_refunded += refund.shipping_refund;
        self.tax_refunded += refund.tax_refund;
        self.return_fees += refund.return_fee;
        true
    }

    /// Rounded metrics; net and total are derived from the rounded parts
    pub fn finish(&self) -> RevenueMetrics {
        let gross_sales = round_money(self.gross_sales);
        let discounts = round_money(self.discounts);
        let returns = round_money(self.returns);
        let shipping_charges = round_money(self.shipping_charged - self.shipping_refunded);
        let taxes = round_money(self.tax_charged - self.tax_refunded);
        let return_fees = round_money(self.return_fees);

        let net_sales = gross_sales - discounts - returns;
        let total_sales = net_sales + shipping_charges + taxes - return_fees;

        RevenueMetrics {
            gross_sales,
            discounts,
            returns,
            net_sales,
            shipping_charges,
            return_fees,
            taxes,
            total_sales,
        }
    }
}

/// Revenue for a window plus what the calculation noticed on the way
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RevenueBreakdown {
    pub metrics: RevenueMetrics,
    pub sales_orders: usize,
    pub refunds_counted: usize,
    /// Zero-total refunds seen in the window, counted or not
    pub zero_total_refunds: usize,
    /// Orders whose line items or refund line items may be incomplete
    pub possibly_truncated_orders: Vec<String>,
}

/// Orders whose own creation instant lies in the window
pub fn sales_set<'a>(window: &TimeWindow, orders: &'a [OrderRecord]) -> Vec<&'a OrderRecord> {
    orders.iter().filter(|o| window.contains(o.created_at)).collect()
}

/// Refunds of any merged order whose own creation instant lies in the window
pub fn refunds_in_window<'a>(
    window: &TimeWindow,
    orders: &'a [OrderRecord],
) -> Vec<(&'a OrderRecord, &'a RefundRecord)> {
    orders
        .iter()
        .flat_map(|o| o.refunds.iter().map(move |r| (o, r)))
        .filter(|(_, r)| window.contains(r.created_at))
        .collect()
}

/// Revenue metrics over merged order records
pub fn calculate_revenue(
    window: &TimeWindow,
    orders: &[OrderRecord],
    policy: ZeroTotalRefundPolicy,
) -> RevenueBreakdown {
    let mut acc = RevenueAccumulator::new();
    let mut breakdown = RevenueBreakdown::default();
    let mut truncated = BTreeSet::new();

    for order in sales_set(window, orders) {
        acc.add_sale(order);
        breakdown.sales_orders += 1;
        if order.line_items_truncated {
            truncated.insert(order.id.clone());
        }
    }

    for (order, refund) in refunds_in_window(window, orders) {
        if refund.is_zero_total() {
            breakdown.zero_total_refunds += 1;
            tracing::debug!(
                order_id = %order.id,
                refund_id = %refund.id,
                policy = ?policy,
                "Zero-total refund with non-zero line items"
            );
        }
        if acc.add_refund(refund, policy) {
            breakdown.refunds_counted += 1;
        }
        if refund.line_items_truncated {
            truncated.insert(order.id.clone());
        }
    }

    breakdown.metrics = acc.finish();
    breakdown.possibly_truncated_orders = truncated.into_iter().collect();

    tracing::debug!(
        sales_orders = breakdown.sales_orders,
        refunds = breakdown.refunds_counted,
        net_sales = %breakdown.metrics.net_sales,
        "Revenue calculated"
    );
    breakdown
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::money_eq;
    use crate::window::DEFAULT_TIME_ZONE;
    use chrono::{DateTime, Utc};
    use shared::models::LineItem;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn week() -> TimeWindow {
        TimeWindow::resolve("2026-01-26", "2026-02-01", DEFAULT_TIME_ZONE).unwrap()
    }

    fn item(quantity: i64, price: &str) -> LineItem {
        let unit = dec(price);
        LineItem {
            quantity,
            original_unit_price: unit,
            original_total: unit * Decimal::from(quantity),
            discounted_total: unit * Decimal::from(quantity),
            sku: None,
            design_id: None,
        }
    }

    fn order(id: &str, created: &str, items: Vec<LineItem>) -> OrderRecord {
        OrderRecord {
            id: id.into(),
            name: None,
            created_at: utc(created),
            updated_at: utc(created),
            line_items: items,
            line_items_truncated: false,
            refunds: vec![],
            shipping_charge: Decimal::ZERO,
            tax_total: Decimal::ZERO,
            discount_total: Decimal::ZERO,
        }
    }

    fn refund(created: &str, subtotal: &str, total: &str) -> RefundRecord {
        RefundRecord {
            id: format!("refund-{created}"),
            created_at: utc(created),
            total_refunded: dec(total),
            line_item_subtotals: vec![dec(subtotal)],
            line_items_truncated: false,
            shipping_refund: Decimal::ZERO,
            tax_refund: Decimal::ZERO,
            return_fee: Decimal::ZERO,
        }
    }

    #[test]
    fn test_zero_orders_all_zero() {
        let b = calculate_revenue(&week(), &[], ZeroTotalRefundPolicy::Include);
        assert_eq!(b.metrics, RevenueMetrics::default());
        assert!(b.metrics.fields().iter().all(|(_, v)| v.is_zero()));
    }

    #[test]
    fn test_gross_uses_unit_price_times_quantity() {
        let mut o = order("a", "2026-01-27T15:00:00Z", vec![item(3, "19.99"), item(1, "5.00")]);
        // discounted totals must not leak into gross
        o.line_items[0].discounted_total = dec("10.00");
        o.discount_total = dec("4.97");
        o.shipping_charge = dec("4.95");
        o.tax_total = dec("2.10");

        let m = calculate_revenue(&week(), &[o], ZeroTotalRefundPolicy::Include).metrics;
        assert_eq!(m.gross_sales, dec("64.97"));
        assert_eq!(m.discounts, dec("4.97"));
        assert_eq!(m.net_sales, dec("60.00"));
        assert_eq!(m.total_sales, dec("67.05"));
        assert!(money_eq(m.net_sales, m.gross_sales - m.discounts - m.returns));
    }

    #[test]
    fn test_refund_attribution_both_directions() {
        // sold before the window, refunded inside it
        let mut early = order("early", "2026-01-20T15:00:00Z", vec![item(1, "300.00")]);
        early.refunds.push(refund("2026-01-28T15:00:00Z", "300.00", "300.00"));
        // sold inside the window, refunded after it
        let mut late = order("late", "2026-01-30T15:00:00Z", vec![item(1, "150.00")]);
        late.refunds.push(refund("2026-02-05T15:00:00Z", "150.00", "150.00"));

        let b = calculate_revenue(&week(), &[early, late], ZeroTotalRefundPolicy::Include);
        assert_eq!(b.sales_orders, 1);
        assert_eq!(b.metrics.gross_sales, dec("150.00"));
        assert_eq!(b.metrics.returns, dec("300.00"));
        assert_eq!(b.metrics.net_sales, dec("-150.00"));
    }

    #[test]
    fn test_refund_shipping_tax_and_fees() {
        let mut o = order("a", "2026-01-27T15:00:00Z", vec![item(2, "50.00")]);
        o.shipping_charge = dec("10.00");
        o.tax_total = dec("8.00");
        let mut r = refund("2026-01-29T15:00:00Z", "50.00", "57.00");
        r.shipping_refund = dec("3.00");
        r.tax_refund = dec("4.00");
        r.return_fee = dec("2.50");
        o.refunds.push(r);

        let m = calculate_revenue(&week(), &[o], ZeroTotalRefundPolicy::Include).metrics;
        assert_eq!(m.returns, dec("50.00"));
        assert_eq!(m.shipping_charges, dec("7.00"));
        assert_eq!(m.taxes, dec("4.00"));
        assert_eq!(m.return_fees, dec("2.50"));
        assert_eq!(m.total_sales, dec("58.50"));
    }

    #[test]
    fn test_zero_total_refund_policy() {
        let mut o = order("a", "2026-01-27T15:00:00Z", vec![item(1, "80.00")]);
        o.refunds.push(refund("2026-01-28T15:00:00Z", "80.00", "0"));
        let orders = [o];

        let included = calculate_revenue(&week(), &orders, ZeroTotalRefundPolicy::Include);
        assert_eq!(included.metrics.returns, dec("80.00"));
        assert_eq!(included.zero_total_refunds, 1);

        let excluded = calculate_revenue(&week(), &orders, ZeroTotalRefundPolicy::Exclude);
        assert_eq!(excluded.metrics.returns, Decimal::ZERO);
        assert_eq!(excluded.zero_total_refunds, 1);
        assert_eq!(excluded.refunds_counted, 0);
    }

    #[test]
    fn test_truncation_flags_listed() {
        let mut a = order("a", "2026-01-27T15:00:00Z", vec![item(1, "1.00")]);
        a.line_items_truncated = true;
        let mut b = order("b", "2026-01-10T15:00:00Z", vec![]);
        let mut r = refund("2026-01-28T15:00:00Z", "1.00", "1.00");
        r.line_items_truncated = true;
        b.refunds.push(r);
        // out of window: ignored even though truncated
        let mut c = order("c", "2026-03-01T15:00:00Z", vec![]);
        c.line_items_truncated = true;

        let out = calculate_revenue(&week(), &[a, b, c], ZeroTotalRefundPolicy::Include);
        assert_eq!(out.possibly_truncated_orders, vec!["a", "b"]);
    }

    #[test]
    fn test_window_bounds_inclusive_to_the_millisecond() {
        let inside = order("in", "2026-02-02T04:59:59.999Z", vec![item(1, "75.00")]);
        let outside = order("out", "2026-02-02T05:00:00.000Z", vec![item(1, "99.00")]);
        let m = calculate_revenue(&week(), &[inside, outside], ZeroTotalRefundPolicy::Include).metrics;
        assert_eq!(m.gross_sales, dec("75.00"));
    }
}
