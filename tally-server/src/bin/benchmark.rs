//! tally-benchmark: compare computed revenue with the published reference week
//!
//! Usage: `tally-benchmark [from] [to]` (local dates, default: the reference week)

use std::process::ExitCode;
use std::sync::Arc;

use shared::models::ZeroTotalRefundPolicy;
use tally_client::{ClientConfig, GraphqlOrderClient};
use tally_engine::RevenueEngine;
use tally_engine::benchmark::{
    BENCHMARK_TOLERANCE, REFERENCE_WEEK_END, REFERENCE_WEEK_START, all_within_tolerance, compare,
    reference_week, render_table,
};
use tally_server::{BoxError, Config};

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    tally_server::init_tracing();

    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("Benchmark failed: {e}");
            ExitCode::from(2)
        }
    }
}

async fn run() -> Result<bool, BoxError> {
    let mut args = std::env::args().skip(1);
    let from = args.next().unwrap_or_else(|| REFERENCE_WEEK_START.to_string());
    let to = args.next().unwrap_or_else(|| REFERENCE_WEEK_END.to_string());

    let config = Config::from_env()?;
    let client = GraphqlOrderClient::new(
        &ClientConfig::new(&config.upstream_graphql_url).with_token(&config.upstream_access_token),
    )?;
    let engine = RevenueEngine::new(Arc::new(client), config.engine_config());

    let report = engine
        .calculate_revenue(&from, &to, ZeroTotalRefundPolicy::default())
        .await?;

    for warning in &report.diagnostics.warnings {
        tracing::warn!("{warning}");
    }
    tracing::info!(
        start = %report.window.start_utc,
        end = %report.window.end_utc,
        orders = report.diagnostics.merged_orders,
        "Revenue calculated"
    );

    let deviations = compare(&report.revenue, &reference_week(), BENCHMARK_TOLERANCE);
    println!("{}", render_table(&deviations));

    let passed = all_within_tolerance(&deviations);
    if passed {
        println!("All fields within ${BENCHMARK_TOLERANCE}");
    } else {
        println!("Deviation above ${BENCHMARK_TOLERANCE} on at least one field");
    }
    Ok(passed)
}
