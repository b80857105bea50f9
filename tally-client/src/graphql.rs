//! GraphQL implementation of [`OrderApi`]
//!
//! The list query stays lightweight (ids and timestamps only); everything the
//! calculators need comes from the `nodes(ids:)` batch query.

use crate::{
    ClientConfig, ClientError, ClientResult, DetailEntry, OrderApi, OrderFilter, OrderPage,
    PageInfo,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use shared::models::{LineItem, OrderRecord, OrderSummary, RefundRecord};
use std::time::Duration;

/// Retries after the first attempt of a throttled request
const MAX_RETRIES: u32 = 3;
/// First backoff delay, doubled per attempt
const INITIAL_RETRY_DELAY_MS: u64 = 500;
/// Backoff cap
const MAX_RETRY_DELAY_SECS: u64 = 10;

/// Line items fetched per order (upstream connection ceiling)
pub const LINE_ITEM_LIMIT: u32 = 250;
/// Line items fetched per refund
pub const REFUND_LINE_ITEM_LIMIT: u32 = 50;

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Adjustment reason counted as a return fee
const RETURN_FEE_REASON: &str = "RESTOCK";

const LIST_ORDERS_QUERY: &str = r#"
query ListOrders($query: String!, $first: Int!, $after: String) {
  orders(first: $first, after: $after, query: $query) {
    edges { node { id createdAt updatedAt } }
    pageInfo { hasNextPage endCursor }
  }
}"#;

const ORDER_DETAILS_QUERY: &str = r#"
query OrderDetails($ids: [ID!]!) {
  nodes(ids: $ids) {
    __typename
    ... on Order {
      id
      name
      createdAt
      updatedAt
      totalDiscountsSet { shopMoney { amount } }
      totalShippingPriceSet { shopMoney { amount } }
      totalTaxSet { shopMoney { amount } }
      lineItems(first: 250) {
        pageInfo { hasNextPage }
        nodes {
          quantity
          sku
          originalUnitPriceSet { shopMoney { amount } }
          originalTotalSet { shopMoney { amount } }
          discountedTotalSet { shopMoney { amount } }
          customAttributes { key value }
        }
      }
      refunds {
        id
        createdAt
        totalRefundedSet { shopMoney { amount } }
        refundLineItems(first: 50) {
          pageInfo { hasNextPage }
          nodes {
            subtotalSet { shopMoney { amount } }
            totalTaxSet { shopMoney { amount } }
          }
        }
        refundShippingLines(first: 10) {
          nodes {
            subtotalAmountSet { shopMoney { amount } }
            taxAmountSet { shopMoney { amount } }
          }
        }
        orderAdjustments(first: 10) {
          nodes {
            reason
            amountSet { shopMoney { amount } }
          }
        }
      }
    }
  }
}"#;

/// GraphQL order client over HTTP
#[derive(Debug, Clone)]
pub struct GraphqlOrderClient {
    client: Client,
    graphql_url: String,
    access_token: Option<String>,
}

impl GraphqlOrderClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        if config.graphql_url.trim().is_empty() {
            return Err(ClientError::Config("graphql_url is empty".into()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()?;
        Ok(Self {
            client,
            graphql_url: config.graphql_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
        })
    }

    pub fn graphql_url(&self) -> &str {
        &self.graphql_url
    }

    /// Run a query, retrying with exponential backoff while throttled
    async fn execute<T: DeserializeOwned>(&self, query: &str, variables: Value) -> ClientResult<T> {
        let mut retries = 0;

        loop {
            match self.post_once(query, &variables).await {
                Err(e) => match retry_delay(&e, retries) {
                    Some(delay) => {
                        retries += 1;
                        tracing::warn!(
                            retry = retries,
                            max_retries = MAX_RETRIES,
                            delay_ms = delay.as_millis() as u64,
                            "Upstream request failed, retrying: {e}"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => return Err(e),
                },
                ok => return ok,
            }
        }
    }

    async fn post_once<T: DeserializeOwned>(&self, query: &str, variables: &Value) -> ClientResult<T> {
        let mut req = self
            .client
            .post(&self.graphql_url)
            .json(&json!({ "query": query, "variables": variables }));
        if let Some(token) = &self.access_token {
            req = req.header(ACCESS_TOKEN_HEADER, token);
        }

        let response = req.send().await?;
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ClientError::Throttled);
        }
        if !status.is_success() {
            let body = response.text().await?;
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: GraphqlResponse<T> = response.json().await?;
        check_errors(&envelope.errors)?;
        envelope
            .data
            .ok_or_else(|| ClientError::InvalidResponse("missing data".into()))
    }
}

#[async_trait]
impl OrderApi for GraphqlOrderClient {
    async fn list_orders(
        &self,
        filter: &OrderFilter,
        page_size: u32,
        after: Option<&str>,
    ) -> ClientResult<OrderPage> {
        let variables = json!({
            "query": filter.to_query_string(),
            "first": page_size,
            "after": after,
        });
        let data: OrdersData = self.execute(LIST_ORDERS_QUERY, variables).await?;

        Ok(OrderPage {
            edges: data
                .orders
                .edges
                .into_iter()
                .map(|edge| OrderSummary {
                    id: edge.node.id,
                    created_at: edge.node.created_at,
                    updated_at: edge.node.updated_at,
                })
                .collect(),
            page_info: PageInfo {
                has_next_page: data.orders.page_info.has_next_page,
                end_cursor: data.orders.page_info.end_cursor,
            },
        })
    }

    async fn get_orders(&self, ids: &[String]) -> ClientResult<Vec<DetailEntry>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let data: NodesData = self
            .execute(ORDER_DETAILS_QUERY, json!({ "ids": ids }))
            .await?;
        Ok(decode_detail_nodes(data.nodes))
    }
}

// ========== Wire format ==========

#[derive(Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
    #[serde(default)]
    extensions: Option<ErrorExtensions>,
}

#[derive(Debug, Deserialize)]
struct ErrorExtensions {
    code: Option<String>,
}

#[derive(Deserialize)]
struct OrdersData {
    orders: OrderConnection,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderConnection {
    edges: Vec<OrderEdge>,
    page_info: WirePageInfo,
}

#[derive(Deserialize)]
struct OrderEdge {
    node: OrderSummaryNode,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderSummaryNode {
    id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Deserialize)]
struct NodesData {
    nodes: Vec<Option<Value>>,
}

#[derive(Deserialize)]
struct MoneyBag {
    #[serde(rename = "shopMoney")]
    shop_money: Money,
}

#[derive(Deserialize)]
struct Money {
    amount: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionPageInfo {
    has_next_page: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Connection<T> {
    page_info: Option<ConnectionPageInfo>,
    nodes: Vec<T>,
}

impl<T> Connection<T> {
    fn has_more(&self) -> bool {
        self.page_info.as_ref().is_some_and(|p| p.has_next_page)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderNode {
    id: String,
    name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    total_discounts_set: Option<MoneyBag>,
    total_shipping_price_set: Option<MoneyBag>,
    total_tax_set: Option<MoneyBag>,
    line_items: Connection<LineItemNode>,
    #[serde(default)]
    refunds: Vec<RefundNode>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LineItemNode {
    quantity: i64,
    sku: Option<String>,
    original_unit_price_set: MoneyBag,
    original_total_set: Option<MoneyBag>,
    discounted_total_set: Option<MoneyBag>,
    #[serde(default)]
    custom_attributes: Vec<Attribute>,
}

#[derive(Deserialize)]
struct Attribute {
    key: String,
    value: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefundNode {
    id: String,
    created_at: DateTime<Utc>,
    total_refunded_set: Option<MoneyBag>,
    refund_line_items: Connection<RefundLineItemNode>,
    refund_shipping_lines: Option<Connection<RefundShippingLineNode>>,
    order_adjustments: Option<Connection<OrderAdjustmentNode>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefundLineItemNode {
    subtotal_set: MoneyBag,
    total_tax_set: Option<MoneyBag>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefundShippingLineNode {
    subtotal_amount_set: MoneyBag,
    tax_amount_set: Option<MoneyBag>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderAdjustmentNode {
    reason: Option<String>,
    amount_set: MoneyBag,
}

// ========== Decoding ==========

fn check_errors(errors: &[GraphqlError]) -> ClientResult<()> {
    if errors.is_empty() {
        return Ok(());
    }
    let throttled = errors.iter().any(|e| {
        e.extensions
            .as_ref()
            .and_then(|x| x.code.as_deref())
            .is_some_and(|code| code == "THROTTLED")
    });
    if throttled {
        return Err(ClientError::Throttled);
    }
    let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
    Err(ClientError::Graphql(messages.join("; ")))
}

fn parse_amount(bag: &MoneyBag) -> ClientResult<Decimal> {
    bag.shop_money
        .amount
        .trim()
        .parse::<Decimal>()
        .map_err(|e| ClientError::InvalidResponse(format!("bad amount {:?}: {e}", bag.shop_money.amount)))
}

fn amount_or_zero(bag: Option<&MoneyBag>) -> ClientResult<Decimal> {
    bag.map(parse_amount).transpose().map(Option::unwrap_or_default)
}

fn design_id(attributes: &[Attribute]) -> Option<String> {
    attributes
        .iter()
        .filter(|a| a.key == "_design_id" || a.key == "design_id")
        .filter_map(|a| a.value.as_deref().map(str::trim))
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

impl LineItemNode {
    fn into_line_item(self) -> ClientResult<LineItem> {
        Ok(LineItem {
            quantity: self.quantity,
            original_unit_price: parse_amount(&self.original_unit_price_set)?,
            original_total: amount_or_zero(self.original_total_set.as_ref())?,
            discounted_total: amount_or_zero(self.discounted_total_set.as_ref())?,
            design_id: design_id(&self.custom_attributes),
            sku: self.sku,
        })
    }
}

impl RefundNode {
    fn into_refund(self) -> ClientResult<RefundRecord> {
        let line_items_truncated = self.refund_line_items.has_more();

        let mut line_item_subtotals = Vec::with_capacity(self.refund_line_items.nodes.len());
        let mut tax_refund = Decimal::ZERO;
        for li in &self.refund_line_items.nodes {
            line_item_subtotals.push(parse_amount(&li.subtotal_set)?);
            tax_refund += amount_or_zero(li.total_tax_set.as_ref())?;
        }

        let mut shipping_refund = Decimal::ZERO;
        if let Some(lines) = &self.refund_shipping_lines {
            for line in &lines.nodes {
                shipping_refund += parse_amount(&line.subtotal_amount_set)?;
                tax_refund += amount_or_zero(line.tax_amount_set.as_ref())?;
            }
        }

        let mut return_fee = Decimal::ZERO;
        if let Some(adjustments) = &self.order_adjustments {
            for adj in &adjustments.nodes {
                if adj.reason.as_deref() == Some(RETURN_FEE_REASON) {
                    return_fee += parse_amount(&adj.amount_set)?.abs();
                }
            }
        }

        Ok(RefundRecord {
            id: self.id,
            created_at: self.created_at,
            total_refunded: amount_or_zero(self.total_refunded_set.as_ref())?,
            line_item_subtotals,
            line_items_truncated,
            shipping_refund,
            tax_refund,
            return_fee,
        })
    }
}

impl OrderNode {
    fn into_record(self) -> ClientResult<OrderRecord> {
        let line_items_truncated = self.line_items.has_more();
        let line_items = self
            .line_items
            .nodes
            .into_iter()
            .map(LineItemNode::into_line_item)
            .collect::<ClientResult<Vec<_>>>()?;
        let refunds = self
            .refunds
            .into_iter()
            .map(RefundNode::into_refund)
            .collect::<ClientResult<Vec<_>>>()?;

        Ok(OrderRecord {
            id: self.id,
            name: self.name,
            created_at: self.created_at,
            updated_at: self.updated_at,
            line_items,
            line_items_truncated,
            refunds,
            shipping_charge: amount_or_zero(self.total_shipping_price_set.as_ref())?,
            tax_total: amount_or_zero(self.total_tax_set.as_ref())?,
            discount_total: amount_or_zero(self.total_discounts_set.as_ref())?,
        })
    }
}

/// Backoff before the next attempt, or `None` once the error is final
fn retry_delay(err: &ClientError, retries: u32) -> Option<Duration> {
    if !err.is_retryable() || retries >= MAX_RETRIES {
        return None;
    }
    let delay = Duration::from_millis(INITIAL_RETRY_DELAY_MS) * 2u32.pow(retries);
    Some(delay.min(Duration::from_secs(MAX_RETRY_DELAY_SECS)))
}

/// Classify each batch entry: order, null, another record type, or malformed.
/// A node that fails to decode never takes the rest of the batch with it.
fn decode_detail_nodes(nodes: Vec<Option<Value>>) -> Vec<DetailEntry> {
    nodes.into_iter().map(decode_detail_node).collect()
}

fn decode_detail_node(node: Option<Value>) -> DetailEntry {
    let value = match node {
        None | Some(Value::Null) => return DetailEntry::Missing,
        Some(value) => value,
    };
    let typename = value
        .get("__typename")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    if typename != "Order" {
        return DetailEntry::Other(typename);
    }

    let id = value.get("id").and_then(Value::as_str).map(String::from);
    let decoded = serde_json::from_value::<OrderNode>(value)
        .map_err(ClientError::from)
        .and_then(OrderNode::into_record);
    match decoded {
        Ok(record) => DetailEntry::Order(Box::new(record)),
        Err(e) => {
            tracing::warn!(order_id = ?id, "Undecodable order node: {e}");
            DetailEntry::Malformed {
                id,
                reason: e.to_string(),
            }
        }
    }
}
