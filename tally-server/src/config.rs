//! Server configuration

use chrono_tz::Tz;
use tally_engine::window::{DEFAULT_TIME_ZONE, parse_time_zone};
use tally_engine::{EngineConfig, FetchConfig};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite connection URL
    pub database_url: String,
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// Order API GraphQL endpoint
    pub upstream_graphql_url: String,
    pub upstream_access_token: String,
    /// Business time zone for caller dates
    pub time_zone: Tz,
    pub fetch: FetchConfig,
    /// Shipping rate service; without it unlabelled orders stream as missing
    pub rate_service_url: Option<String>,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    fn parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
        std::env::var(name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let time_zone = match std::env::var("BUSINESS_TIME_ZONE") {
            Ok(name) if !name.trim().is_empty() => parse_time_zone(&name)?,
            _ => DEFAULT_TIME_ZONE,
        };

        let defaults = FetchConfig::default();
        let fetch = FetchConfig {
            page_size: Self::parsed("PAGE_SIZE", defaults.page_size),
            max_pages: Self::parsed("MAX_PAGES", defaults.max_pages),
            detail_batch_size: Self::parsed("DETAIL_BATCH_SIZE", defaults.detail_batch_size),
            detail_concurrency: Self::parsed("DETAIL_CONCURRENCY", defaults.detail_concurrency),
        }
        .normalized();

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:tally.db".into()),
            http_port: Self::parsed("HTTP_PORT", 8080),
            upstream_graphql_url: std::env::var("UPSTREAM_GRAPHQL_URL")
                .map_err(|_| "UPSTREAM_GRAPHQL_URL must be set")?,
            upstream_access_token: Self::require_secret("UPSTREAM_ACCESS_TOKEN", &environment)?,
            rate_service_url: std::env::var("RATE_SERVICE_URL")
                .ok()
                .filter(|s| !s.is_empty()),
            time_zone,
            fetch,
            environment,
        })
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            time_zone: self.time_zone,
            fetch: self.fetch,
        }
    }
}
