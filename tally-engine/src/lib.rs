//! Tally Engine - revenue & profitability reconciliation
//!
//! Components, leaves first:
//! - [`window`]: business-local calendar range → inclusive UTC instants
//! - [`fetcher`]: bounded cursor pagination against the order API
//! - [`merge`]: created/modified union + batch detail fetch
//! - [`revenue`]: canonical revenue metrics
//! - [`costs`]: actual + extrapolated operating costs
//! - [`composer`]: profitability report, daily series, snapshots
//! - [`stream`]: incremental shipping-cost enumeration
//! - [`benchmark`]: tolerance comparison against reference figures

pub mod benchmark;
pub mod composer;
pub mod costs;
pub mod error;
pub mod fetcher;
pub mod merge;
pub mod money;
pub mod revenue;
pub mod series;
pub mod store;
pub mod stream;
pub mod window;

pub use composer::{EngineConfig, OrderDataset, ProfitabilityEngine, RevenueEngine, RevenueReport};
pub use error::{EngineError, EngineResult};
pub use fetcher::FetchConfig;
pub use store::{DbService, RepoError, RepoResult};
pub use stream::{ProgressEvent, ProgressSink, ProgressStream, StreamTarget, progress_channel};
pub use window::TimeWindow;
