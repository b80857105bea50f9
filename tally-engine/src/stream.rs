//! Shipping-cost progress stream
//!
//! Protocol (one JSON object per event, `{ "type", "data" }`):
//! - `SUMMARY` once, before any per-order work
//! - `PROGRESS` once per order, in order
//! - `COMPLETE` once, then the stream ends
//!
//! The producer owns a [`ProgressSink`]; the transport owns the matching
//! [`ProgressStream`]. Dropping the stream is how a consumer disconnects.

use futures::Stream;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tally_client::RateQuoter;
use tokio::sync::mpsc;

use crate::money::round_money;

/// Buffered events between producer and consumer
pub const STREAM_BUFFER: usize = 64;

/// What a shipping-cost stream enumerates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamTarget {
    /// Sales set of a window (`from`, `to` as caller strings)
    Window { from: String, to: String },
    /// Explicit order ids (global id form)
    OrderIds(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostSource {
    /// Purchased label in the local mirror
    Label,
    /// Rate-service quote
    Quote,
    /// Neither label nor quote
    Missing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingSummary {
    pub total_orders: usize,
    pub labelled_orders: usize,
    pub known_label_cost: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingProgress {
    pub order_id: String,
    pub cost: Option<Decimal>,
    pub source: CostSource,
    pub processed: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingComplete {
    pub total_orders: usize,
    pub labelled_orders: usize,
    pub quoted_orders: usize,
    pub label_cost: Decimal,
    pub quoted_cost: Decimal,
    pub total_cost: Decimal,
    pub orders_without_shipping: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressEvent {
    Summary(ShippingSummary),
    Progress(ShippingProgress),
    Complete(ShippingComplete),
}

impl ProgressEvent {
    /// One NDJSON line, newline included
    pub fn to_ndjson(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

/// Producer half; never fails, and does nothing once closed
pub struct ProgressSink {
    tx: Option<mpsc::Sender<ProgressEvent>>,
}

impl ProgressSink {
    /// Deliver an event; `false` if the sink is closed or the consumer left
    pub async fn send(&mut self, event: ProgressEvent) -> bool {
        let Some(tx) = &self.tx else {
            return false;
        };
        if tx.send(event).await.is_err() {
            tracing::debug!("Progress consumer gone, closing sink");
            self.tx = None;
            return false;
        }
        true
    }

    pub fn close(&mut self) {
        self.tx = None;
    }

    /// Closed locally or the consumer dropped its end
    pub fn is_closed(&self) -> bool {
        self.tx.as_ref().is_none_or(|tx| tx.is_closed())
    }
}

/// Consumer half
pub struct ProgressStream {
    rx: mpsc::Receiver<ProgressEvent>,
}

impl Stream for ProgressStream {
    type Item = ProgressEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Single-producer/single-consumer progress channel
pub fn progress_channel() -> (ProgressSink, ProgressStream) {
    let (tx, rx) = mpsc::channel(STREAM_BUFFER);
    (ProgressSink { tx: Some(tx) }, ProgressStream { rx })
}

/// Enumerate shipping cost per order: label from the mirror, else a quote
/// when a rate service is configured, else missing.
pub async fn produce_shipping_costs(
    mut sink: ProgressSink,
    order_ids: Vec<String>,
    labels: HashMap<String, Decimal>,
    quoter: Option<Arc<dyn RateQuoter>>,
) {
    let total = order_ids.len();
    let labelled = order_ids.iter().filter(|id| labels.contains_key(*id)).count();
    let label_cost = round_money(
        order_ids
            .iter()
            .filter_map(|id| labels.get(id))
            .copied()
            .sum(),
    );

    let summary = ShippingSummary {
        total_orders: total,
        labelled_orders: labelled,
        known_label_cost: label_cost,
    };
    if !sink.send(ProgressEvent::Summary(summary)).await {
        return;
    }

    let mut quoted_orders = 0;
    let mut quoted_cost = Decimal::ZERO;
    let mut without_shipping = Vec::new();

    for (index, order_id) in order_ids.into_iter().enumerate() {
        let (cost, source) = match labels.get(&order_id) {
            Some(cost) => (Some(round_money(*cost)), CostSource::Label),
            None => match &quoter {
                Some(quoter) => {
                    if sink.is_closed() {
                        tracing::info!(
                            processed = index,
                            total,
                            "Consumer disconnected, stopping shipping-cost stream"
                        );
                        return;
                    }
                    match quoter.quote(&order_id).await {
                        Ok(Some(rate)) => (Some(round_money(rate)), CostSource::Quote),
                        Ok(None) => (None, CostSource::Missing),
                        Err(e) => {
                            tracing::warn!(order_id = %order_id, "Rate quote failed: {e}");
                            (None, CostSource::Missing)
                        }
                    }
                }
                None => (None, CostSource::Missing),
            },
        };

        match (source, cost) {
            (CostSource::Quote, Some(cost)) => {
                quoted_orders += 1;
                quoted_cost += cost;
                without_shipping.push(order_id.clone());
            }
            (CostSource::Missing, _) => without_shipping.push(order_id.clone()),
            _ => {}
        }

        let progress = ShippingProgress {
            order_id,
            cost,
            source,
            processed: index + 1,
            total,
        };
        if !sink.send(ProgressEvent::Progress(progress)).await {
            tracing::info!(processed = index + 1, total, "Consumer disconnected mid-stream");
            return;
        }
    }

    let complete = ShippingComplete {
        total_orders: total,
        labelled_orders: labelled,
        quoted_orders,
        label_cost,
        quoted_cost,
        total_cost: label_cost + quoted_cost,
        orders_without_shipping: without_shipping,
    };
    sink.send(ProgressEvent::Complete(complete)).await;
    sink.close();
}
