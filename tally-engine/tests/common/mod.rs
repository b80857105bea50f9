//! Shared fixtures for engine integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::models::{LineItem, OrderRecord, RefundRecord};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tally_client::{
    ClientError, ClientResult, DetailEntry, OrderApi, OrderFilter, OrderPage, PageInfo,
    TimestampField,
};
use tally_engine::store::MIGRATOR;
use tally_engine::{EngineConfig, ProfitabilityEngine, RevenueEngine};

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub fn utc(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

pub fn gid(n: u32) -> String {
    format!("gid://shopify/Order/{n}")
}

/// In-memory order API filtering by the predicate it is given
pub struct StubOrderApi {
    orders: Vec<OrderRecord>,
    pub list_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
    fail_listing: bool,
}

impl StubOrderApi {
    pub fn new(orders: Vec<OrderRecord>) -> Self {
        Self {
            orders,
            list_calls: AtomicUsize::new(0),
            detail_calls: AtomicUsize::new(0),
            fail_listing: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_listing: true,
            ..Self::new(vec![])
        }
    }
}

#[async_trait]
impl OrderApi for StubOrderApi {
    async fn list_orders(
        &self,
        filter: &OrderFilter,
        page_size: u32,
        after: Option<&str>,
    ) -> ClientResult<OrderPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing {
            return Err(ClientError::Status {
                status: 401,
                body: "Invalid API key or access token".into(),
            });
        }

        let mut matching: Vec<&OrderRecord> = self
            .orders
            .iter()
            .filter(|o| match filter.field {
                TimestampField::CreatedAt => filter.contains(o.created_at),
                TimestampField::UpdatedAt => filter.contains(o.updated_at),
            })
            .collect();
        matching.sort_by(|a, b| a.id.cmp(&b.id));

        let offset: usize = after.map(|c| c.parse().unwrap()).unwrap_or(0);
        let end = (offset + page_size as usize).min(matching.len());
        let has_next_page = end < matching.len();
        Ok(OrderPage {
            edges: matching[offset..end].iter().map(|o| o.summary()).collect(),
            page_info: PageInfo {
                has_next_page,
                end_cursor: has_next_page.then(|| end.to_string()),
            },
        })
    }

    async fn get_orders(&self, ids: &[String]) -> ClientResult<Vec<DetailEntry>> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        Ok(ids
            .iter()
            .map(|id| match self.orders.iter().find(|o| &o.id == id) {
                Some(o) => DetailEntry::Order(Box::new(o.clone())),
                None => DetailEntry::Missing,
            })
            .collect())
    }
}

pub fn item(quantity: i64, price: &str) -> LineItem {
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

pub struct OrderInput<'a> {
    pub n: u32,
    pub created: &'a str,
    pub updated: &'a str,
    pub items: Vec<LineItem>,
    pub discount: &'a str,
    pub shipping: &'a str,
    pub tax: &'a str,
}

pub fn order(input: OrderInput<'_>) -> OrderRecord {
    OrderRecord {
        id: gid(input.n),
        name: Some(format!("#{}", input.n)),
        created_at: utc(input.created),
        updated_at: utc(input.updated),
        line_items: input.items,
        line_items_truncated: false,
        refunds: vec![],
        shipping_charge: dec(input.shipping),
        tax_total: dec(input.tax),
        discount_total: dec(input.discount),
    }
}

pub fn refund(id: &str, created: &str, subtotals: &[&str], shipping: &str, tax: &str) -> RefundRecord {
    let line_item_subtotals: Vec<Decimal> = subtotals.iter().map(|s| dec(s)).collect();
    let total = line_item_subtotals.iter().copied().sum::<Decimal>() + dec(shipping) + dec(tax);
    RefundRecord {
        id: id.into(),
        created_at: utc(created),
        total_refunded: total,
        line_item_subtotals,
        line_items_truncated: false,
        shipping_refund: dec(shipping),
        tax_refund: dec(tax),
        return_fee: Decimal::ZERO,
    }
}

/// Orders behind the reference week (2026-01-26 – 2026-02-01, New York)
pub fn reference_orders() -> Vec<OrderRecord> {
    let o1 = order(OrderInput {
        n: 1001,
        created: "2026-01-26T14:15:00Z",
        updated: "2026-01-27T09:00:00Z",
        items: vec![item(2, "49.99"), item(1, "120.00")],
        discount: "20.00",
        shipping: "8.95",
        tax: "6.20",
    });
    // 23:30 local on the 27th
    let o2 = order(OrderInput {
        n: 1002,
        created: "2026-01-28T04:30:00Z",
        updated: "2026-01-28T04:30:00Z",
        items: vec![item(3, "215.50")],
        discount: "64.65",
        shipping: "12.50",
        tax: "0.00",
    });
    let mut o3 = order(OrderInput {
        n: 1003,
        created: "2026-01-29T16:40:00Z",
        updated: "2026-01-31T20:05:00Z",
        items: vec![item(10, "199.99"), item(4, "89.00")],
        discount: "235.59",
        shipping: "25.00",
        tax: "31.40",
    });
    o3.refunds.push(refund(
        "gid://shopify/Refund/501",
        "2026-01-31T20:05:00Z",
        &["599.97", "94.47"],
        "10.00",
        "5.00",
    ));
    // refunded after the window: sale counts, refund does not
    let mut o4 = order(OrderInput {
        n: 1004,
        created: "2026-01-30T19:00:00Z",
        updated: "2026-02-05T15:00:00Z",
        items: vec![item(1, "1500.00"), item(2, "250.00")],
        discount: "300.00",
        shipping: "0.00",
        tax: "40.00",
    });
    o4.refunds.push(refund(
        "gid://shopify/Refund/502",
        "2026-02-05T15:00:00Z",
        &["150.00"],
        "0.00",
        "0.00",
    ));
    // 23:59:59.5 local on the last day
    let o5 = order(OrderInput {
        n: 1005,
        created: "2026-02-02T04:59:59.500Z",
        updated: "2026-02-02T04:59:59.500Z",
        items: vec![item(1, "75.00")],
        discount: "0.00",
        shipping: "6.95",
        tax: "4.50",
    });
    let mut o6 = order(OrderInput {
        n: 1006,
        created: "2026-01-31T18:00:00Z",
        updated: "2026-01-31T18:30:00Z",
        items: vec![item(8, "1249.63")],
        discount: "1580.30",
        shipping: "360.46",
        tax: "122.80",
    });
    o6.line_items[0].design_id = Some("dsn-4471".into());
    // sold the week before, refunded inside the window
    let mut o0 = order(OrderInput {
        n: 998,
        created: "2026-01-20T15:00:00Z",
        updated: "2026-01-28T17:00:00Z",
        items: vec![item(2, "150.00")],
        discount: "0.00",
        shipping: "0.00",
        tax: "0.00",
    });
    o0.refunds.push(refund(
        "gid://shopify/Refund/500",
        "2026-01-28T17:00:00Z",
        &["300.00"],
        "0.00",
        "0.00",
    ));
    // first instant after the window
    let late = order(OrderInput {
        n: 1007,
        created: "2026-02-02T05:00:00Z",
        updated: "2026-02-02T05:00:00Z",
        items: vec![item(1, "999.00")],
        discount: "0.00",
        shipping: "0.00",
        tax: "0.00",
    });

    vec![o0, o1, o2, o3, o4, o5, o6, late]
}

/// Single-connection in-memory pool with the schema applied
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    MIGRATOR.run(&pool).await.unwrap();
    pool
}

pub fn revenue_engine(api: Arc<dyn OrderApi>, config: EngineConfig) -> RevenueEngine {
    RevenueEngine::new(api, config)
}

pub async fn profitability_engine(orders: Vec<OrderRecord>) -> ProfitabilityEngine {
    let api = Arc::new(StubOrderApi::new(orders));
    ProfitabilityEngine::new(revenue_engine(api, EngineConfig::default()), memory_pool().await)
}
