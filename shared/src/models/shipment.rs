//! Shipment Model (local mirror of label purchases)

use serde::{Deserialize, Serialize};

/// Shipment row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Shipment {
    pub id: i64,
    /// Upstream order id (global id form)
    pub order_id: String,
    pub carrier: Option<String>,
    pub service: Option<String>,
    pub tracking_number: Option<String>,
    /// Label cost paid to the carrier
    pub label_cost: f64,
    pub purchased: bool,
    pub refunded: bool,
    /// Unix millis
    pub created_at: i64,
}

/// Create shipment payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentCreate {
    pub order_id: String,
    pub carrier: Option<String>,
    pub service: Option<String>,
    pub tracking_number: Option<String>,
    pub label_cost: f64,
    #[serde(default = "default_true")]
    pub purchased: bool,
    #[serde(default)]
    pub refunded: bool,
}

fn default_true() -> bool {
    true
}
