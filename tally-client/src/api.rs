//! Upstream contracts consumed by the engine

use crate::{ClientResult, OrderFilter};
use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::models::{OrderRecord, OrderSummary};

/// Cursor position after a page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// One page of the lightweight order list query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderPage {
    pub edges: Vec<OrderSummary>,
    pub page_info: PageInfo,
}

/// One entry of a batch detail response
#[derive(Debug, Clone, PartialEq)]
pub enum DetailEntry {
    Order(Box<OrderRecord>),
    /// Null entry (deleted or inaccessible record)
    Missing,
    /// A record of another type, carrying its typename
    Other(String),
    /// An order node that could not be decoded
    Malformed { id: Option<String>, reason: String },
}

/// Paginated order listing and batch detail fetch
#[async_trait]
pub trait OrderApi: Send + Sync {
    /// One page of orders matching `filter`, starting after `after`
    async fn list_orders(
        &self,
        filter: &OrderFilter,
        page_size: u32,
        after: Option<&str>,
    ) -> ClientResult<OrderPage>;

    /// Full records for `ids`, one entry per id in request order
    async fn get_orders(&self, ids: &[String]) -> ClientResult<Vec<DetailEntry>>;
}

/// Shipping rate quotes for orders without a purchased label
#[async_trait]
pub trait RateQuoter: Send + Sync {
    /// Cheapest available rate, `None` when the service has no quote
    async fn quote(&self, order_id: &str) -> ClientResult<Option<Decimal>>;
}
