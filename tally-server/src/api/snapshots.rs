//! Saved report snapshots

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::{ReportSnapshot, ReportSnapshotSummary, ZeroTotalRefundPolicy};
use tally_engine::store::reports::{DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};

use crate::api::profitability::WindowQuery;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSnapshotRequest {
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(default)]
    pub use_historical_payroll: bool,
    #[serde(default)]
    pub zero_total_refunds: ZeroTotalRefundPolicy,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Snapshot with its report decoded
#[derive(Debug, Serialize)]
pub struct SnapshotResponse {
    pub id: i64,
    pub window_start: String,
    pub window_end: String,
    pub time_zone: String,
    pub net_sales: f64,
    pub total_expenses: f64,
    pub net_profit: f64,
    pub created_at: i64,
    pub report: serde_json::Value,
}

impl TryFrom<ReportSnapshot> for SnapshotResponse {
    type Error = serde_json::Error;

    fn try_from(s: ReportSnapshot) -> Result<Self, Self::Error> {
        Ok(Self {
            report: serde_json::from_str(&s.report)?,
            id: s.id,
            window_start: s.window_start,
            window_end: s.window_end,
            time_zone: s.time_zone,
            net_sales: s.net_sales,
            total_expenses: s.total_expenses,
            net_profit: s.net_profit,
            created_at: s.created_at,
        })
    }
}

fn decode(snapshot: ReportSnapshot) -> ApiResult<SnapshotResponse> {
    let id = snapshot.id;
    let response = SnapshotResponse::try_from(snapshot).map_err(|e| {
        tracing::error!(snapshot = id, "Stored report is unreadable: {e}");
        AppError::new(ErrorCode::InternalError)
    })?;
    Ok(Json(response))
}

/// POST /api/profitability/snapshots
pub async fn create_snapshot(
    State(state): State<AppState>,
    Json(req): Json<CreateSnapshotRequest>,
) -> ApiResult<SnapshotResponse> {
    let (from, to, options) = WindowQuery {
        from: req.from,
        to: req.to,
        use_historical_payroll: req.use_historical_payroll,
        zero_total_refunds: req.zero_total_refunds,
    }
    .into_parts()?;

    let snapshot = state.engine.save_snapshot(&from, &to, options).await?;
    tracing::info!(
        snapshot = snapshot.id,
        window_start = %snapshot.window_start,
        window_end = %snapshot.window_end,
        "Report snapshot saved"
    );
    decode(snapshot)
}

/// GET /api/profitability/snapshots?limit=&offset=
pub async fn list_snapshots(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<ReportSnapshotSummary>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
    let offset = query.offset.unwrap_or(0).max(0);
    Ok(Json(state.engine.list_snapshots(limit, offset).await?))
}

/// GET /api/profitability/snapshots/{id}
pub async fn get_snapshot(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<SnapshotResponse> {
    decode(state.engine.get_snapshot(id).await?)
}
