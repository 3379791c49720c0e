//! Typed errors and HTTP mapping.

use crate::response::failure;
use crate::store::StoreError;
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    /// Store failures keep their source for the log; the caller only sees the action.
    #[error("store error while {action}: {source}")]
    Store {
        action: &'static str,
        #[source]
        source: StoreError,
    },
}

impl AppError {
    /// `map_err` adapter naming what the handler was doing when the store failed.
    pub fn store(action: &'static str) -> impl FnOnce(StoreError) -> AppError {
        move |source| AppError::Store { action, source }
    }

    pub fn todo_not_found() -> Self {
        AppError::NotFound("Todo item not found.".into())
    }

    pub fn invalid_record_id() -> Self {
        AppError::BadRequest("Invalid ID parameter. Must be a valid ObjectId or a numeric custom ID.".into())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(format!("Invalid query parameters: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(format!("Invalid path parameter: {}", rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(m) | AppError::Validation(m) => (StatusCode::BAD_REQUEST, m.clone()),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            AppError::Store { action, source } => {
                tracing::error!(error = %source, action, "store operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("An error occurred while {}.", action),
                )
            }
        };
        (status, Json(failure(message))).into_response()
    }
}
