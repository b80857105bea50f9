//! Order deduplication and batch detail fetch

use futures::StreamExt;
use shared::models::{OrderRecord, OrderSummary};
use std::collections::HashSet;
use tally_client::{DetailEntry, OrderApi};

use crate::fetcher::FetchConfig;

/// Identity-keyed union of predicate runs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedSummaries {
    pub orders: Vec<OrderSummary>,
    /// Entries dropped because their id was already present
    pub duplicates_collapsed: usize,
}

impl MergedSummaries {
    pub fn ids(&self) -> Vec<String> {
        self.orders.iter().map(|o| o.id.clone()).collect()
    }
}

/// Union `runs` keyed by order id; first occurrence wins
pub fn merge_summaries(runs: &[&[OrderSummary]]) -> MergedSummaries {
    let mut seen = HashSet::new();
    let mut merged = MergedSummaries::default();
    for summary in runs.iter().flat_map(|run| run.iter()) {
        if seen.insert(summary.id.as_str()) {
            merged.orders.push(summary.clone());
        } else {
            merged.duplicates_collapsed += 1;
        }
    }
    merged
}

/// Full records for a merged id set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailOutcome {
    /// Sorted by `created_at`, then id
    pub orders: Vec<OrderRecord>,
    pub skipped_missing: usize,
    pub skipped_wrong_type: usize,
    pub skipped_malformed: usize,
    pub failed_batches: usize,
    pub warnings: Vec<String>,
}

/// Fetch full records in fixed-size batches with bounded concurrency.
///
/// Null, wrong-type and undecodable entries and failed batches are counted
/// and skipped; none of them fail the fetch.
pub async fn fetch_details(api: &dyn OrderApi, ids: &[String], config: &FetchConfig) -> DetailOutcome {
    let config = config.normalized();

    let mut results: Vec<_> = futures::stream::iter(ids.chunks(config.detail_batch_size).enumerate())
        .map(|(index, batch)| async move { (index, batch.len(), api.get_orders(batch).await) })
        .buffer_unordered(config.detail_concurrency)
        .boxed()
        .collect()
        .await;
    results.sort_by_key(|(index, _, _)| *index);

    let mut outcome = DetailOutcome::default();
    let mut seen = HashSet::new();
    for (index, size, result) in results {
        let entries = match result {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(batch = index, size, "Batch detail fetch failed, skipping batch: {e}");
                outcome.failed_batches += 1;
                outcome
                    .warnings
                    .push(format!("detail batch {index} ({size} ids) failed: {e}"));
                continue;
            }
        };
        for entry in entries {
            match entry {
                DetailEntry::Order(order) => {
                    if seen.insert(order.id.clone()) {
                        outcome.orders.push(*order);
                    }
                }
                DetailEntry::Missing => outcome.skipped_missing += 1,
                DetailEntry::Other(typename) => {
                    tracing::debug!(batch = index, typename = %typename, "Skipping non-order detail entry");
                    outcome.skipped_wrong_type += 1;
                }
                DetailEntry::Malformed { id, reason } => {
                    outcome.skipped_malformed += 1;
                    outcome.warnings.push(format!(
                        "order {} skipped: {reason}",
                        id.as_deref().unwrap_or("<unknown>")
                    ));
                }
            }
        }
    }

    outcome
        .orders
        .sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

    if outcome.skipped_missing + outcome.skipped_wrong_type + outcome.skipped_malformed > 0 {
        tracing::info!(
            missing = outcome.skipped_missing,
            wrong_type = outcome.skipped_wrong_type,
            malformed = outcome.skipped_malformed,
            "Skipped batch detail entries"
        );
    }
    outcome
}
