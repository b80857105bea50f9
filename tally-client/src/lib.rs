//! Tally Client - upstream collaborators of the reconciliation engine
//!
//! - [`OrderApi`]: cursor-paginated order listing and batch detail fetch
//! - [`RateQuoter`]: shipping rate quotes for orders without a purchased label

pub mod api;
pub mod config;
pub mod error;
pub mod filter;
pub mod graphql;
pub mod rates;

pub use api::{DetailEntry, OrderApi, OrderPage, PageInfo, RateQuoter};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use filter::{OrderFilter, TimestampField};
pub use graphql::GraphqlOrderClient;
pub use rates::HttpRateQuoter;
