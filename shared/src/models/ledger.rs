//! Cost Ledger Model (recorded recurring costs)

use serde::{Deserialize, Serialize};

/// Recurring cost category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostCategory {
    Labor,
    Rent,
    Marketing,
}

impl CostCategory {
    pub const ALL: [CostCategory; 3] = [Self::Labor, Self::Rent, Self::Marketing];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Labor => "labor",
            Self::Rent => "rent",
            Self::Marketing => "marketing",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "labor" => Some(Self::Labor),
            "rent" => Some(Self::Rent),
            "marketing" => Some(Self::Marketing),
            _ => None,
        }
    }
}

/// Ledger row: an amount recorded for a closed date period
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct LedgerEntry {
    pub id: i64,
    /// `labor` | `rent` | `marketing`
    pub category: String,
    /// First day of the period (YYYY-MM-DD, inclusive)
    pub period_start: String,
    /// Last day of the period (YYYY-MM-DD, inclusive)
    pub period_end: String,
    pub amount: f64,
    pub note: Option<String>,
}

/// Create ledger entry payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntryCreate {
    pub category: CostCategory,
    pub period_start: String,
    pub period_end: String,
    pub amount: f64,
    pub note: Option<String>,
}
