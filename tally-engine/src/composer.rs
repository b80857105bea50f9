//! Profitability composer
//!
//! Entry points for every calculation. Each call resolves its window, fetches
//! orders once, loads cost inputs once and builds a fresh report; nothing is
//! shared between calls except the clients and the pool.

use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::error::ErrorCode;
use shared::models::{
    CalculationDiagnostics, DailyPoint, OrderRecord, ProfitabilityOptions, ProfitabilityReport,
    ReportSnapshot, ReportSnapshotSummary, ReportWindow, RevenueMetrics, ZeroTotalRefundPolicy,
};
use shared::util::normalize_order_id;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use tally_client::{OrderApi, RateQuoter};

use crate::costs::{CostInputs, aggregate_costs};
use crate::error::{EngineError, EngineResult};
use crate::fetcher::{FetchConfig, fetch_created_and_modified};
use crate::merge::{fetch_details, merge_summaries};
use crate::money::ratio;
use crate::revenue::{calculate_revenue, sales_set};
use crate::series::daily_series;
use crate::store;
use crate::stream::{ProgressStream, StreamTarget, produce_shipping_costs, progress_channel};
use crate::window::{DEFAULT_TIME_ZONE, TimeWindow};

/// Engine tuning shared by every calculation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub time_zone: Tz,
    pub fetch: FetchConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            time_zone: DEFAULT_TIME_ZONE,
            fetch: FetchConfig::default(),
        }
    }
}

/// Merged, fully-detailed orders for one window
#[derive(Debug, Clone)]
pub struct OrderDataset {
    pub window: TimeWindow,
    /// Sorted by `created_at`, then id
    pub orders: Vec<OrderRecord>,
    pub diagnostics: CalculationDiagnostics,
}

impl OrderDataset {
    pub fn sales_orders(&self) -> Vec<&OrderRecord> {
        sales_set(&self.window, &self.orders)
    }

    pub fn sales_order_ids(&self) -> Vec<String> {
        self.sales_orders().iter().map(|o| o.id.clone()).collect()
    }
}

/// Revenue-only result (benchmark entry point)
#[derive(Debug, Clone, Serialize)]
pub struct RevenueReport {
    pub window: ReportWindow,
    pub revenue: RevenueMetrics,
    pub diagnostics: CalculationDiagnostics,
}

/// Revenue side: window resolution, fetching, merging
#[derive(Clone)]
pub struct RevenueEngine {
    api: Arc<dyn OrderApi>,
    config: EngineConfig,
}

impl RevenueEngine {
    pub fn new(api: Arc<dyn OrderApi>, config: EngineConfig) -> Self {
        Self { api, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn resolve_window(&self, from: &str, to: &str) -> EngineResult<TimeWindow> {
        TimeWindow::resolve(from, to, self.config.time_zone)
    }

    /// Created and modified runs, merged and detail-fetched
    pub async fn load_dataset(&self, window: TimeWindow) -> EngineResult<OrderDataset> {
        let api = self.api.as_ref();
        let fetch = self.config.fetch;

        let (created, modified) = fetch_created_and_modified(
            api,
            window.created_filter(),
            window.updated_filter(),
            &fetch,
        )
        .await;

        let mut diagnostics = CalculationDiagnostics {
            created_matches: created.orders.len(),
            modified_matches: modified.orders.len(),
            pagination_truncated: created.truncated || modified.truncated,
            upstream_incomplete: created.warning.is_some() || modified.warning.is_some(),
            ..Default::default()
        };
        if created.pages == 0 && modified.pages == 0 && diagnostics.upstream_incomplete {
            tracing::error!(
                start = %window.start_utc,
                end = %window.end_utc,
                "Order API returned no pages; report covers no orders"
            );
            diagnostics.warn("order API unavailable; no orders were fetched");
        }
        if diagnostics.pagination_truncated {
            diagnostics.warn(format!(
                "page ceiling of {} pages reached; results may be incomplete",
                fetch.normalized().max_pages
            ));
        }
        diagnostics.warnings.extend(created.warning.iter().cloned());
        diagnostics.warnings.extend(modified.warning.iter().cloned());

        let merged = merge_summaries(&[&created.orders, &modified.orders]);
        diagnostics.duplicates_collapsed = merged.duplicates_collapsed;

        let details = fetch_details(api, &merged.ids(), &fetch).await;
        diagnostics.merged_orders = details.orders.len();
        diagnostics.skipped_missing = details.skipped_missing;
        diagnostics.skipped_wrong_type = details.skipped_wrong_type;
        diagnostics.skipped_malformed = details.skipped_malformed;
        diagnostics.upstream_incomplete |= details.failed_batches > 0;
        diagnostics.warnings.extend(details.warnings);

        tracing::info!(
            start = %window.start_utc,
            end = %window.end_utc,
            created = diagnostics.created_matches,
            modified = diagnostics.modified_matches,
            merged = diagnostics.merged_orders,
            "Order dataset loaded"
        );

        Ok(OrderDataset {
            window,
            orders: details.orders,
            diagnostics,
        })
    }

    pub async fn calculate_revenue(
        &self,
        from: &str,
        to: &str,
        policy: ZeroTotalRefundPolicy,
    ) -> EngineResult<RevenueReport> {
        let window = self.resolve_window(from, to)?;
        let dataset = self.load_dataset(window).await?;
        let breakdown = calculate_revenue(&dataset.window, &dataset.orders, policy);

        let mut diagnostics = dataset.diagnostics;
        diagnostics.possibly_truncated_orders = breakdown.possibly_truncated_orders;
        diagnostics.zero_total_refunds = breakdown.zero_total_refunds;

        Ok(RevenueReport {
            window: dataset.window.describe(),
            revenue: breakdown.metrics,
            diagnostics,
        })
    }
}

/// Revenue plus costs, snapshots and the shipping-cost stream
#[derive(Clone)]
pub struct ProfitabilityEngine {
    revenue: RevenueEngine,
    pool: SqlitePool,
    rates: Option<Arc<dyn RateQuoter>>,
}

impl ProfitabilityEngine {
    pub fn new(revenue: RevenueEngine, pool: SqlitePool) -> Self {
        Self {
            revenue,
            pool,
            rates: None,
        }
    }

    pub fn with_rate_quoter(mut self, quoter: Arc<dyn RateQuoter>) -> Self {
        self.rates = Some(quoter);
        self
    }

    pub fn revenue_engine(&self) -> &RevenueEngine {
        &self.revenue
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn calculate_profitability(
        &self,
        window_start: &str,
        window_end: &str,
        options: ProfitabilityOptions,
    ) -> EngineResult<ProfitabilityReport> {
        let window = self.revenue.resolve_window(window_start, window_end)?;
        let dataset = self.revenue.load_dataset(window).await?;
        self.compose(dataset, &options).await
    }

    async fn compose(
        &self,
        dataset: OrderDataset,
        options: &ProfitabilityOptions,
    ) -> EngineResult<ProfitabilityReport> {
        let window = &dataset.window;
        let revenue = calculate_revenue(window, &dataset.orders, options.zero_total_refunds);

        let sales = dataset.sales_orders();
        let sales_ids = dataset.sales_order_ids();
        let inputs =
            CostInputs::load(&self.pool, &sales_ids, window.start_date(), window.end_date()).await?;
        let costs = aggregate_costs(&inputs, &sales, window.start_date(), window.end_date(), options);

        let total_expenses = costs.metrics.total();
        let net_profit = revenue.metrics.net_sales - total_expenses;
        let profit_margin = ratio(net_profit, revenue.metrics.net_sales);

        let mut diagnostics = dataset.diagnostics.clone();
        diagnostics.possibly_truncated_orders = revenue.possibly_truncated_orders;
        diagnostics.zero_total_refunds = revenue.zero_total_refunds;
        diagnostics.orders_without_shipping = costs.orders_without_shipping;

        tracing::info!(
            net_sales = %revenue.metrics.net_sales,
            total_expenses = %total_expenses,
            net_profit = %net_profit,
            "Profitability calculated"
        );

        Ok(ProfitabilityReport {
            window: window.describe(),
            revenue: revenue.metrics,
            costs: costs.metrics,
            total_expenses,
            net_profit,
            profit_margin,
            diagnostics,
        })
    }

    /// One point per local day, from a single fetch of the full range
    pub async fn daily_series(
        &self,
        window_start: &str,
        window_end: &str,
        options: ProfitabilityOptions,
    ) -> EngineResult<Vec<DailyPoint>> {
        let window = self.revenue.resolve_window(window_start, window_end)?;
        let dataset = self.revenue.load_dataset(window).await?;
        let inputs = CostInputs::load(
            &self.pool,
            &dataset.sales_order_ids(),
            dataset.window.start_date(),
            dataset.window.end_date(),
        )
        .await?;
        Ok(daily_series(&dataset.window, &dataset.orders, &inputs, &options))
    }

    /// Calculate and persist as an immutable snapshot
    pub async fn save_snapshot(
        &self,
        window_start: &str,
        window_end: &str,
        options: ProfitabilityOptions,
    ) -> EngineResult<ReportSnapshot> {
        let report = self
            .calculate_profitability(window_start, window_end, options)
            .await?;
        Ok(store::reports::insert(&self.pool, &report).await?)
    }

    pub async fn list_snapshots(&self, limit: i64, offset: i64) -> EngineResult<Vec<ReportSnapshotSummary>> {
        Ok(store::reports::list(&self.pool, limit, offset).await?)
    }

    pub async fn get_snapshot(&self, id: i64) -> EngineResult<ReportSnapshot> {
        Ok(store::reports::find_by_id(&self.pool, id).await?)
    }

    /// Start streaming shipping costs; window and order loading happen
    /// before the stream is returned so input errors surface as errors.
    pub async fn shipping_cost_stream(&self, target: StreamTarget) -> EngineResult<ProgressStream> {
        let order_ids = match target {
            StreamTarget::Window { from, to } => {
                let window = self.revenue.resolve_window(&from, &to)?;
                self.revenue.load_dataset(window).await?.sales_order_ids()
            }
            StreamTarget::OrderIds(raw) => normalize_ids(&raw)?,
        };

        let shipments = store::shipments::find_purchased_for_orders(&self.pool, &order_ids).await?;
        let mut labels: HashMap<String, Decimal> = HashMap::new();
        for s in &shipments {
            *labels.entry(s.order_id.clone()).or_default() += crate::money::to_decimal(s.label_cost);
        }

        tracing::info!(
            orders = order_ids.len(),
            labelled = labels.len(),
            "Starting shipping-cost stream"
        );

        let (sink, stream) = progress_channel();
        tokio::spawn(produce_shipping_costs(
            sink,
            order_ids,
            labels,
            self.rates.clone(),
        ));
        Ok(stream)
    }
}

/// Accept bare numeric ids or global ids; reject anything else
fn normalize_ids(raw: &[String]) -> EngineResult<Vec<String>> {
    if raw.is_empty() {
        return Err(EngineError::invalid(
            ErrorCode::RequiredField,
            "At least one order id is required",
        ));
    }
    let mut ids = Vec::with_capacity(raw.len());
    for id in raw {
        let normalized = normalize_order_id(id).ok_or_else(|| {
            EngineError::invalid(ErrorCode::InvalidOrderId, format!("Invalid order id: {id:?}"))
        })?;
        if !ids.contains(&normalized) {
            ids.push(normalized);
        }
    }
    Ok(ids)
}
