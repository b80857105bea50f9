//! Report Snapshot Repository
//!
//! Rows are write-once; there is no update path.

use super::{RepoError, RepoResult};
use crate::money::to_f64;
use shared::models::{ProfitabilityReport, ReportSnapshot, ReportSnapshotSummary};
use sqlx::SqlitePool;

pub const DEFAULT_LIST_LIMIT: i64 = 50;
pub const MAX_LIST_LIMIT: i64 = 500;

/// Persist a report as an immutable JSON snapshot
pub async fn insert(pool: &SqlitePool, report: &ProfitabilityReport) -> RepoResult<ReportSnapshot> {
    let body = serde_json::to_string(report)
        .map_err(|e| RepoError::Validation(format!("Report not serializable: {e}")))?;
    let now = shared::util::now_millis();

    let snapshot = sqlx::query_as::<_, ReportSnapshot>(
        "INSERT INTO profitability_reports (window_start, window_end, time_zone, net_sales, total_expenses, net_profit, report, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING id, window_start, window_end, time_zone, net_sales, total_expenses, net_profit, report, created_at",
    )
    .bind(report.window.start_utc.to_rfc3339())
    .bind(report.window.end_utc.to_rfc3339())
    .bind(&report.window.time_zone)
    .bind(to_f64(report.revenue.net_sales))
    .bind(to_f64(report.total_expenses))
    .bind(to_f64(report.net_profit))
    .bind(body)
    .bind(now)
    .fetch_one(pool)
    .await?;

    tracing::info!(snapshot_id = snapshot.id, "Profitability snapshot saved");
    Ok(snapshot)
}

/// Most recent first
pub async fn list(pool: &SqlitePool, limit: i64, offset: i64) -> RepoResult<Vec<ReportSnapshotSummary>> {
    let rows = sqlx::query_as::<_, ReportSnapshotSummary>(
        "SELECT id, window_start, window_end, time_zone, net_sales, total_expenses, net_profit, created_at FROM profitability_reports ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
    )
    .bind(limit.clamp(1, MAX_LIST_LIMIT))
    .bind(offset.max(0))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<ReportSnapshot> {
    sqlx::query_as::<_, ReportSnapshot>(
        "SELECT id, window_start, window_end, time_zone, net_sales, total_expenses, net_profit, report, created_at FROM profitability_reports WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| RepoError::NotFound(format!("Snapshot {id}")))
}
