//! Data models
//!
//! Domain types (orders, metrics) keep money as `Decimal`.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`
//! and store money as `f64`.

pub mod ledger;
pub mod metrics;
pub mod order;
pub mod report;
pub mod settings;
pub mod shipment;

// Re-exports
pub use ledger::*;
pub use metrics::*;
pub use order::*;
pub use report::*;
pub use settings::*;
pub use shipment::*;
