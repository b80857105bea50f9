//! Server application state

use std::sync::Arc;
use tally_client::{ClientConfig, GraphqlOrderClient, HttpRateQuoter};
use tally_engine::{DbService, ProfitabilityEngine, RevenueEngine};

use crate::config::{BoxError, Config};

/// Shared across handlers; the engine is cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub engine: ProfitabilityEngine,
}

impl AppState {
    /// Open the store, build the upstream clients and wire the engine
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let db = DbService::new(&config.database_url).await?;

        let client = GraphqlOrderClient::new(
            &ClientConfig::new(&config.upstream_graphql_url)
                .with_token(&config.upstream_access_token),
        )?;
        tracing::info!(url = %client.graphql_url(), "Order API client ready");

        let revenue = RevenueEngine::new(Arc::new(client), config.engine_config());
        let mut engine = ProfitabilityEngine::new(revenue, db.pool);

        if let Some(url) = &config.rate_service_url {
            let quoter = HttpRateQuoter::new(url)?;
            tracing::info!(url = %quoter.base_url(), "Rate service enabled");
            engine = engine.with_rate_quoter(Arc::new(quoter));
        } else {
            tracing::warn!("RATE_SERVICE_URL not set, unlabelled orders will stream without a quote");
        }

        Ok(Self { engine })
    }

    pub fn from_engine(engine: ProfitabilityEngine) -> Self {
        Self { engine }
    }
}
