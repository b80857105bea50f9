//! Cost Settings Repository (Singleton)

use super::RepoResult;
use crate::money::to_decimal;
use rust_decimal::Decimal;
use shared::models::{CostSettings, CostSettingsRow};
use sqlx::SqlitePool;

const SINGLETON_ID: i64 = 1;

pub async fn get(pool: &SqlitePool) -> RepoResult<Option<CostSettingsRow>> {
    let row = sqlx::query_as::<_, CostSettingsRow>(
        "SELECT supply_cost_per_item, bag_cost_per_order, ink_cost_per_design, monthly_labor, monthly_rent, monthly_marketing, updated_at FROM cost_settings WHERE id = ?",
    )
    .bind(SINGLETON_ID)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Settings for one calculation; a missing row or column falls back to defaults
pub async fn load(pool: &SqlitePool) -> RepoResult<CostSettings> {
    let Some(row) = get(pool).await? else {
        tracing::debug!("No cost settings row, using defaults");
        return Ok(CostSettings::default());
    };
    Ok(resolve(&row))
}

/// Insert or replace the singleton row
pub async fn upsert(pool: &SqlitePool, row: &CostSettingsRow) -> RepoResult<()> {
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO cost_settings (id, supply_cost_per_item, bag_cost_per_order, ink_cost_per_design, monthly_labor, monthly_rent, monthly_marketing, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) ON CONFLICT(id) DO UPDATE SET supply_cost_per_item = ?2, bag_cost_per_order = ?3, ink_cost_per_design = ?4, monthly_labor = ?5, monthly_rent = ?6, monthly_marketing = ?7, updated_at = ?8",
    )
    .bind(SINGLETON_ID)
    .bind(row.supply_cost_per_item)
    .bind(row.bag_cost_per_order)
    .bind(row.ink_cost_per_design)
    .bind(row.monthly_labor)
    .bind(row.monthly_rent)
    .bind(row.monthly_marketing)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

fn resolve(row: &CostSettingsRow) -> CostSettings {
    let defaults = CostSettings::default();
    let pick = |value: Option<f64>, fallback: Decimal| value.map(to_decimal).unwrap_or(fallback);
    CostSettings {
        supply_cost_per_item: pick(row.supply_cost_per_item, defaults.supply_cost_per_item),
        bag_cost_per_order: pick(row.bag_cost_per_order, defaults.bag_cost_per_order),
        ink_cost_per_design: pick(row.ink_cost_per_design, defaults.ink_cost_per_design),
        monthly_labor: pick(row.monthly_labor, defaults.monthly_labor),
        monthly_rent: pick(row.monthly_rent, defaults.monthly_rent),
        monthly_marketing: pick(row.monthly_marketing, defaults.monthly_marketing),
    }
}
