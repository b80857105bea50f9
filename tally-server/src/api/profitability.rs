//! Profitability report and daily series

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use shared::models::{DailyPoint, ProfitabilityOptions, ProfitabilityReport, ZeroTotalRefundPolicy};

use crate::error::{ApiResult, ServiceError, required};
use crate::state::AppState;

/// Window and calculation options shared by the report endpoints
#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(default)]
    pub use_historical_payroll: bool,
    #[serde(default)]
    pub zero_total_refunds: ZeroTotalRefundPolicy,
}

impl WindowQuery {
    /// `(from, to, options)`, rejecting a missing bound
    pub fn into_parts(self) -> Result<(String, String, ProfitabilityOptions), ServiceError> {
        let from = required(self.from, "from")?;
        let to = required(self.to, "to")?;
        Ok((
            from,
            to,
            ProfitabilityOptions {
                use_historical_payroll: self.use_historical_payroll,
                zero_total_refunds: self.zero_total_refunds,
            },
        ))
    }
}

/// GET /api/profitability?from=&to=
pub async fn get_profitability(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> ApiResult<ProfitabilityReport> {
    let (from, to, options) = query.into_parts()?;
    let report = state
        .engine
        .calculate_profitability(&from, &to, options)
        .await?;
    Ok(Json(report))
}

/// GET /api/profitability/daily?from=&to=
pub async fn get_daily_series(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> ApiResult<Vec<DailyPoint>> {
    let (from, to, options) = query.into_parts()?;
    let points = state.engine.daily_series(&from, &to, options).await?;
    Ok(Json(points))
}
