//! Report Snapshot Model (immutable history rows)

use serde::{Deserialize, Serialize};

/// Saved report snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ReportSnapshot {
    pub id: i64,
    /// Window start (RFC 3339, UTC)
    pub window_start: String,
    /// Window end (RFC 3339, UTC)
    pub window_end: String,
    pub time_zone: String,
    pub net_sales: f64,
    pub total_expenses: f64,
    pub net_profit: f64,
    /// Serialized `ProfitabilityReport`
    pub report: String,
    /// Unix millis
    pub created_at: i64,
}

/// Snapshot list item (without the report body)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ReportSnapshotSummary {
    pub id: i64,
    pub window_start: String,
    pub window_end: String,
    pub time_zone: String,
    pub net_sales: f64,
    pub total_expenses: f64,
    pub net_profit: f64,
    pub created_at: i64,
}
