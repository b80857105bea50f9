//! Order filter predicates
//!
//! The upstream query language only supports `>=` / `<=` string comparisons on
//! ISO-8601 instants, so bounds are always closed and rendered with
//! millisecond precision in UTC.

use chrono::{DateTime, SecondsFormat, Utc};

/// Timestamp an order list query filters on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimestampField {
    CreatedAt,
    UpdatedAt,
}

impl TimestampField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }
}

/// Closed timestamp range on one order field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderFilter {
    pub field: TimestampField,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl OrderFilter {
    pub fn created(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            field: TimestampField::CreatedAt,
            from,
            to,
        }
    }

    pub fn updated(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            field: TimestampField::UpdatedAt,
            from,
            to,
        }
    }

    /// Whether `ts` lies inside the closed range
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.from && ts <= self.to
    }

    /// Upstream search predicate, e.g.
    /// `created_at:>='2026-01-26T05:00:00.000Z' created_at:<='2026-02-02T04:59:59.999Z'`
    pub fn to_query_string(&self) -> String {
        let field = self.field.as_str();
        format!(
            "{field}:>='{}' {field}:<='{}'",
            iso_millis(self.from),
            iso_millis(self.to)
        )
    }
}

/// `YYYY-MM-DDTHH:MM:SS.mmmZ`
pub fn iso_millis(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
