//! Profitability, daily series, snapshots and the shipping-cost stream

mod common;

use async_trait::async_trait;
use common::*;
use futures::StreamExt;
use rust_decimal::Decimal;
use shared::models::{
    CostCategory, CostSettingsRow, LedgerEntryCreate, ProfitabilityOptions, ShipmentCreate,
};
use std::sync::Arc;
use tally_client::{ClientResult, RateQuoter};
use tally_engine::benchmark::{REFERENCE_WEEK_END, REFERENCE_WEEK_START};
use tally_engine::store;
use tally_engine::stream::CostSource;
use tally_engine::{EngineError, ProfitabilityEngine, ProgressEvent, StreamTarget};

fn label(n: u32, cost: f64) -> ShipmentCreate {
    ShipmentCreate {
        order_id: gid(n),
        carrier: Some("UPS".into()),
        service: Some("Ground".into()),
        tracking_number: Some(format!("1Z{n}")),
        label_cost: cost,
        purchased: true,
        refunded: false,
    }
}

fn ledger(category: CostCategory, start: &str, end: &str, amount: f64) -> LedgerEntryCreate {
    LedgerEntryCreate {
        category,
        period_start: start.into(),
        period_end: end.into(),
        amount,
        note: None,
    }
}

/// Labels for 1001, 1003 and 1006; voided or unpurchased labels elsewhere
async fn seeded_engine() -> ProfitabilityEngine {
    let engine = profitability_engine(reference_orders()).await;
    let pool = engine.pool();

    store::shipments::insert(pool, label(1001, 8.12)).await.unwrap();
    store::shipments::insert(pool, label(1003, 15.40)).await.unwrap();
    store::shipments::insert(pool, label(1006, 42.00)).await.unwrap();
    let voided = store::shipments::insert(pool, label(1006, 9.99)).await.unwrap();
    store::shipments::mark_refunded(pool, voided.id).await.unwrap();
    store::shipments::insert(
        pool,
        ShipmentCreate {
            purchased: false,
            ..label(1002, 7.00)
        },
    )
    .await
    .unwrap();
    // outside the sales set
    store::shipments::insert(pool, label(998, 5.00)).await.unwrap();

    store::cost_settings::upsert(
        pool,
        &CostSettingsRow {
            monthly_labor: Some(3100.0),
            monthly_rent: Some(2800.0),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    store::ledger::insert(pool, ledger(CostCategory::Labor, "2026-01-26", "2026-02-01", 4200.0))
        .await
        .unwrap();
    store::ledger::insert(pool, ledger(CostCategory::Rent, "2026-01-01", "2026-01-31", 3100.0))
        .await
        .unwrap();

    engine
}

fn historical() -> ProfitabilityOptions {
    ProfitabilityOptions {
        use_historical_payroll: true,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_reference_week_profitability() {
    let engine = seeded_engine().await;
    let report = engine
        .calculate_profitability(REFERENCE_WEEK_START, REFERENCE_WEEK_END, historical())
        .await
        .unwrap();

    let c = &report.costs;
    assert_eq!(c.fulfillment, dec("65.52"));
    // 25 items × 0.50 + 3 orders × 0.25 + 8 designs × 0.15
    assert_eq!(c.supplies, dec("14.45"));
    assert_eq!(c.labor_cost, dec("4200.00"));
    assert!(!c.is_labor_extrapolated);
    // six January days of the rent entry plus one February day from settings
    assert_eq!(c.rent, dec("700.00"));
    assert!(c.is_rent_extrapolated);
    assert_eq!(c.marketing, Decimal::ZERO);

    assert_eq!(report.total_expenses, dec("4979.97"));
    assert_eq!(report.net_profit, dec("7119.47"));
    assert_eq!(report.net_profit, report.revenue.net_sales - report.total_expenses);
    assert_eq!(report.profit_margin, dec("0.5884"));
    assert_eq!(
        report.diagnostics.orders_without_shipping,
        vec![gid(1002), gid(1004), gid(1005)]
    );
}

#[tokio::test]
async fn test_labor_prorated_without_historical_payroll() {
    let engine = seeded_engine().await;
    let report = engine
        .calculate_profitability(
            REFERENCE_WEEK_START,
            REFERENCE_WEEK_END,
            ProfitabilityOptions::default(),
        )
        .await
        .unwrap();
    // 6 × 3100/31 + 1 × 3100/28
    assert_eq!(report.costs.labor_cost, dec("710.71"));
    assert!(report.costs.is_labor_extrapolated);
}

#[tokio::test]
async fn test_missing_settings_use_defaults() {
    let engine = profitability_engine(reference_orders()).await;
    let report = engine
        .calculate_profitability(
            REFERENCE_WEEK_START,
            REFERENCE_WEEK_END,
            ProfitabilityOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(report.total_expenses, Decimal::ZERO);
    assert_eq!(report.net_profit, report.revenue.net_sales);
    assert_eq!(report.diagnostics.orders_without_shipping.len(), 6);
}

#[tokio::test]
async fn test_zero_net_sales_margin_is_zero() {
    let engine = profitability_engine(vec![]).await;
    let report = engine
        .calculate_profitability("2026-03-01", "2026-03-01", ProfitabilityOptions::default())
        .await
        .unwrap();
    assert_eq!(report.revenue.net_sales, Decimal::ZERO);
    assert_eq!(report.profit_margin, Decimal::ZERO);
}

#[tokio::test]
async fn test_daily_series_sums_to_window() {
    let engine = seeded_engine().await;
    let weekly = engine
        .calculate_profitability(REFERENCE_WEEK_START, REFERENCE_WEEK_END, historical())
        .await
        .unwrap();
    let points = engine
        .daily_series(REFERENCE_WEEK_START, REFERENCE_WEEK_END, historical())
        .await
        .unwrap();

    assert_eq!(points.len(), 7);
    assert_eq!(points[0].date.to_string(), REFERENCE_WEEK_START);
    assert_eq!(points[6].date.to_string(), REFERENCE_WEEK_END);

    let sum = |f: fn(&shared::models::DailyPoint) -> Decimal| points.iter().map(f).sum::<Decimal>();
    assert_eq!(sum(|p| p.revenue.gross_sales), weekly.revenue.gross_sales);
    assert_eq!(sum(|p| p.revenue.net_sales), weekly.revenue.net_sales);
    assert_eq!(sum(|p| p.costs.labor_cost), weekly.costs.labor_cost);
    assert_eq!(sum(|p| p.costs.rent), weekly.costs.rent);
    assert_eq!(sum(|p| p.net_profit), weekly.net_profit);

    // order 1002 was placed late on the 27th local time
    assert_eq!(points[1].revenue.gross_sales, dec("646.50"));
}

#[tokio::test]
async fn test_snapshots_roundtrip() {
    let engine = seeded_engine().await;
    let saved = engine
        .save_snapshot(REFERENCE_WEEK_START, REFERENCE_WEEK_END, historical())
        .await
        .unwrap();
    assert_eq!(saved.net_sales, 12099.44);
    assert_eq!(saved.time_zone, "America/New_York");

    let listed = engine.list_snapshots(10, 0).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, saved.id);

    let fetched = engine.get_snapshot(saved.id).await.unwrap();
    let body: serde_json::Value = serde_json::from_str(&fetched.report).unwrap();
    assert_eq!(body["revenue"]["gross_sales"], 15294.42);
    assert_eq!(body["net_profit"], 7119.47);

    let err = engine.get_snapshot(saved.id + 1).await.unwrap_err();
    assert!(matches!(err, EngineError::Store(store::RepoError::NotFound(_))));
}

struct FlatQuoter;

#[async_trait]
impl RateQuoter for FlatQuoter {
    async fn quote(&self, _order_id: &str) -> ClientResult<Option<Decimal>> {
        Ok(Some(dec("9.99")))
    }
}

#[tokio::test]
async fn test_shipping_stream_for_window() {
    let engine = seeded_engine().await.with_rate_quoter(Arc::new(FlatQuoter));
    let stream = engine
        .shipping_cost_stream(StreamTarget::Window {
            from: REFERENCE_WEEK_START.into(),
            to: REFERENCE_WEEK_END.into(),
        })
        .await
        .unwrap();
    let events: Vec<ProgressEvent> = stream.collect().await;

    assert_eq!(events.len(), 8);
    let ProgressEvent::Summary(summary) = &events[0] else {
        panic!("summary must come first");
    };
    assert_eq!(summary.total_orders, 6);
    assert_eq!(summary.labelled_orders, 3);
    assert_eq!(summary.known_label_cost, dec("65.52"));

    let progress: Vec<_> = events[1..7]
        .iter()
        .map(|e| match e {
            ProgressEvent::Progress(p) => p.clone(),
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(progress[0].order_id, gid(1001));
    assert_eq!(progress[0].source, CostSource::Label);
    assert_eq!(progress[1].order_id, gid(1002));
    assert_eq!(progress[1].source, CostSource::Quote);
    assert!(progress.iter().enumerate().all(|(i, p)| p.processed == i + 1 && p.total == 6));

    let ProgressEvent::Complete(done) = &events[7] else {
        panic!("complete must come last");
    };
    assert_eq!(done.quoted_orders, 3);
    assert_eq!(done.total_cost, dec("95.49"));
}

#[tokio::test]
async fn test_shipping_stream_for_explicit_ids() {
    let engine = seeded_engine().await;
    let stream = engine
        .shipping_cost_stream(StreamTarget::OrderIds(vec!["1003".into(), "4242".into()]))
        .await
        .unwrap();
    let events: Vec<ProgressEvent> = stream.collect().await;
    let ProgressEvent::Complete(done) = events.last().unwrap() else {
        panic!("complete must come last");
    };
    assert_eq!(done.label_cost, dec("15.40"));
    assert_eq!(done.orders_without_shipping, vec![gid(4242)]);

    let err = engine
        .shipping_cost_stream(StreamTarget::OrderIds(vec!["abc".into()]))
        .await
        .err()
        .unwrap();
    assert!(err.is_invalid_input());
}
