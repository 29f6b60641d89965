//! HTTP error mapping.
//!
//! # Responsibility
//! - Map service failures onto status codes with a `{ "error": … }` body.
//! - Describe process-level startup failures.

use crate::config::ConfigError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{error, warn};
use serde_json::json;
use studyhub_core::db::DbError;
use studyhub_core::logging::LoggingError;
use studyhub_core::HabitServiceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing user identity")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("internal error")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<HabitServiceError> for ApiError {
    fn from(value: HabitServiceError) -> Self {
        match value {
            HabitServiceError::Validation(err) => Self::BadRequest(err.to_string()),
            HabitServiceError::NotFound(_) => Self::NotFound("habit not found".to_string()),
            HabitServiceError::Repo(err) => Self::Internal(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self::BadRequest(value.body_text())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Internal(format!("request task failed: {value}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Internal(detail) => {
                error!("event=http_request module=server status=error code={status} error={detail}")
            }
            _ => warn!("event=http_request module=server status=rejected code={status}"),
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Startup failure of the server process.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Logging(#[from] LoggingError),

    #[error("failed to open habit store: {0}")]
    Db(#[from] DbError),

    #[error("server i/o failed: {0}")]
    Io(#[from] std::io::Error),
}
