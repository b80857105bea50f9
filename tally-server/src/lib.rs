//! Tally Server - HTTP surface of the reconciliation engine
//!
//! - [`api`]: axum routes (profitability, daily series, NDJSON shipping
//!   stream, report snapshots)
//! - [`config`]: environment configuration
//! - [`state`]: engine wiring shared by handlers

pub mod api;
pub mod config;
pub mod error;
pub mod state;

pub use config::{BoxError, Config};
pub use state::AppState;

/// Initialize tracing with an env filter fallback
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tally_server=info,tally_engine=info,tower_http=info".into()),
        )
        .init();
}
