//! HTTP rate-service client

use crate::{ClientError, ClientResult, RateQuoter};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::util::order_numeric_id;
use std::time::Duration;

/// Rate service response: `{ "order_id": "...", "rate": "7.45" }`
#[derive(Debug, Deserialize)]
struct QuoteResponse {
    rate: Option<String>,
}

/// Quotes the cheapest label rate for an order via `GET {base}/quotes/{id}`
#[derive(Debug, Clone)]
pub struct HttpRateQuoter {
    client: Client,
    base_url: String,
}

impl HttpRateQuoter {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl RateQuoter for HttpRateQuoter {
    async fn quote(&self, order_id: &str) -> ClientResult<Option<Decimal>> {
        let url = format!("{}/quotes/{}", self.base_url, order_numeric_id(order_id));
        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
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

        let quote: QuoteResponse = response.json().await?;
        parse_rate(quote.rate)
    }
}

fn parse_rate(rate: Option<String>) -> ClientResult<Option<Decimal>> {
    rate.map(|r| {
        r.trim()
            .parse::<Decimal>()
            .map_err(|e| ClientError::InvalidResponse(format!("bad rate {r:?}: {e}")))
    })
    .transpose()
}
