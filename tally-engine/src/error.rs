//! Engine error type

use crate::store::RepoError;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed caller input, rejected before any network call
    #[error("{message}")]
    InvalidInput { code: ErrorCode, message: String },

    #[error("Store error: {0}")]
    Store(#[from] RepoError),
}

impl EngineError {
    pub fn invalid(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            code,
            message: message.into(),
        }
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidInput { code, message } => AppError::with_message(code, message),
            EngineError::Store(RepoError::NotFound(what)) => {
                AppError::with_message(ErrorCode::ReportNotFound, format!("{what} not found"))
            }
            EngineError::Store(e) => {
                tracing::error!(error = %e, "Store error");
                AppError::new(ErrorCode::DatabaseError)
            }
        }
    }
}
