//! Cost Settings Model (single configuration row)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Default supply cost per fulfilled item (0.50)
pub const DEFAULT_SUPPLY_COST_PER_ITEM: Decimal = Decimal::from_parts(50, 0, 0, false, 2);
/// Default bag/label cost per fulfilled order (0.25)
pub const DEFAULT_BAG_COST_PER_ORDER: Decimal = Decimal::from_parts(25, 0, 0, false, 2);
/// Default ink cost per design (0.15)
pub const DEFAULT_INK_COST_PER_DESIGN: Decimal = Decimal::from_parts(15, 0, 0, false, 2);

/// Raw settings row; any column may be NULL
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CostSettingsRow {
    pub supply_cost_per_item: Option<f64>,
    pub bag_cost_per_order: Option<f64>,
    pub ink_cost_per_design: Option<f64>,
    pub monthly_labor: Option<f64>,
    pub monthly_rent: Option<f64>,
    pub monthly_marketing: Option<f64>,
    pub updated_at: Option<i64>,
}

/// Immutable per-call cost configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostSettings {
    pub supply_cost_per_item: Decimal,
    pub bag_cost_per_order: Decimal,
    pub ink_cost_per_design: Decimal,
    pub monthly_labor: Decimal,
    pub monthly_rent: Decimal,
    pub monthly_marketing: Decimal,
}

impl Default for CostSettings {
    fn default() -> Self {
        Self {
            supply_cost_per_item: DEFAULT_SUPPLY_COST_PER_ITEM,
            bag_cost_per_order: DEFAULT_BAG_COST_PER_ORDER,
            ink_cost_per_design: DEFAULT_INK_COST_PER_DESIGN,
            monthly_labor: Decimal::ZERO,
            monthly_rent: Decimal::ZERO,
            monthly_marketing: Decimal::ZERO,
        }
    }
}
