//! Shipping-cost progress stream (NDJSON)

use axum::body::Body;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use http::header;
use serde::Deserialize;
use tally_engine::StreamTarget;

use crate::error::{ServiceResult, required};
use crate::state::AppState;

pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    /// Comma-separated order ids; takes precedence over the window
    pub order_ids: Option<String>,
}

impl StreamQuery {
    pub fn into_target(self) -> ServiceResult<StreamTarget> {
        if let Some(raw) = self.order_ids {
            let ids = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
            return Ok(StreamTarget::OrderIds(ids));
        }
        Ok(StreamTarget::Window {
            from: required(self.from, "from")?,
            to: required(self.to, "to")?,
        })
    }
}

/// GET /api/profitability/shipping-costs/stream?from=&to= | ?order_ids=1,2,3
///
/// One JSON event per line: `SUMMARY`, `PROGRESS` per order, then `COMPLETE`.
/// Closing the connection stops the producer before its next quote.
pub async fn stream_shipping_costs(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> ServiceResult<Response> {
    let target = query.into_target()?;
    let events = state.engine.shipping_cost_stream(target).await?;
    let body = Body::from_stream(events.map(|event| event.to_ndjson()));

    Ok((
        [
            (header::CONTENT_TYPE, NDJSON_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_ids_take_precedence() {
        let query = StreamQuery {
            from: Some("2026-01-26".into()),
            to: None,
            order_ids: Some(" 1001, ,1002,".into()),
        };
        match query.into_target().unwrap() {
            StreamTarget::OrderIds(ids) => assert_eq!(ids, vec!["1001", "1002"]),
            other => panic!("unexpected target: {other:?}"),
        }
    }

    #[test]
    fn test_window_requires_both_bounds() {
        let query = StreamQuery {
            from: Some("2026-01-26".into()),
            to: None,
            order_ids: None,
        };
        assert!(query.into_target().is_err());
    }
}
