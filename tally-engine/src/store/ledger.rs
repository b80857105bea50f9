//! Cost Ledger Repository

use super::{RepoError, RepoResult};
use chrono::NaiveDate;
use shared::models::{LedgerEntry, LedgerEntryCreate};
use sqlx::SqlitePool;

/// Validate date format (YYYY-MM-DD)
fn validate_date(date: &str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| RepoError::Validation(format!("Invalid date format: {date}")))
}

pub async fn insert(pool: &SqlitePool, data: LedgerEntryCreate) -> RepoResult<LedgerEntry> {
    let start = validate_date(&data.period_start)?;
    let end = validate_date(&data.period_end)?;
    if start > end {
        return Err(RepoError::Validation(format!(
            "Period start {start} is after period end {end}"
        )));
    }
    if !data.amount.is_finite() || data.amount < 0.0 {
        return Err(RepoError::Validation(format!("Invalid amount: {}", data.amount)));
    }

    let entry = sqlx::query_as::<_, LedgerEntry>(
        "INSERT INTO cost_ledger (category, period_start, period_end, amount, note) VALUES (?, ?, ?, ?, ?) RETURNING id, category, period_start, period_end, amount, note",
    )
    .bind(data.category.as_str())
    .bind(start.to_string())
    .bind(end.to_string())
    .bind(data.amount)
    .bind(&data.note)
    .fetch_one(pool)
    .await?;
    Ok(entry)
}

/// Entries whose period overlaps `start..=end`
pub async fn find_overlapping(
    pool: &SqlitePool,
    start: NaiveDate,
    end: NaiveDate,
) -> RepoResult<Vec<LedgerEntry>> {
    // ISO dates compare correctly as text
    let entries = sqlx::query_as::<_, LedgerEntry>(
        "SELECT id, category, period_start, period_end, amount, note FROM cost_ledger WHERE period_start <= ? AND period_end >= ? ORDER BY category, period_start, id",
    )
    .bind(end.to_string())
    .bind(start.to_string())
    .fetch_all(pool)
    .await?;
    Ok(entries)
}
