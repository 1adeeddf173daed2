//! Error handling

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use scoring::{ErrorClass, ScoringError};
use serde_json::json;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Errors returned by handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error("Invalid request body: {0}")]
    BadRequest(String),
}

impl ApiError {
    /// Client/server classification
    pub fn class(&self) -> ErrorClass {
        match self {
            ApiError::Scoring(e) => e.class(),
            ApiError::BadRequest(_) => ErrorClass::Client,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.class() {
            ErrorClass::Client => StatusCode::BAD_REQUEST,
            ErrorClass::Server => {
                tracing::error!("Scoring failed: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
