//! Handler error bridge
//!
//! Handlers return [`ServiceError`]; engine errors are converted (and logged)
//! through `AppError` so every failure reaches the client as the shared
//! `{ code, message, details }` body.

use axum::Json;
use axum::response::{IntoResponse, Response};
use shared::error::{AppError, ErrorCode};
use tally_engine::EngineError;

#[derive(Debug)]
pub enum ServiceError {
    Engine(EngineError),
    App(AppError),
}

impl From<EngineError> for ServiceError {
    fn from(e: EngineError) -> Self {
        Self::Engine(e)
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        Self::App(e)
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Engine(err) => AppError::from(err),
            ServiceError::App(err) => err,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// JSON handler result
pub type ApiResult<T> = Result<Json<T>, ServiceError>;

/// Query parameter that must be present and non-blank
pub fn required(value: Option<String>, name: &str) -> Result<String, ServiceError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(
            AppError::with_message(ErrorCode::RequiredField, format!("{name} is required"))
                .with_detail("field", name)
                .into(),
        ),
    }
}
