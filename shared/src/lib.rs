//! Shared types for the Tally workspace
//!
//! Domain models used by the upstream client, the reconciliation engine and
//! the HTTP service, plus the unified error system.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
