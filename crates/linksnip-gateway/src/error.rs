//! Mapping from service errors to HTTP responses.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use linksnip_core::{CoreError, ShortenerError};
use linksnip_redirector::RedirectorError;
use thiserror::Error;
use tracing::{error, warn};

use crate::model::ErrorResponse;

pub type Result<T> = std::result::Result<T, AppError>;

pub const SLUG_TAKEN_MESSAGE: &str = "This custom URL is already taken";
pub const NOT_FOUND_MESSAGE: &str = "Link not found";
pub const INTERNAL_MESSAGE: &str = "Internal server error";

/// Every error a handler can return. Always rendered as `{"error": ..}`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("link not found")]
    NotFound,

    #[error(transparent)]
    Shortener(#[from] ShortenerError),

    #[error(transparent)]
    Redirector(#[from] RedirectorError),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<CoreError> for AppError {
    fn from(error: CoreError) -> Self {
        Self::BadRequest(error.to_string())
    }
}

impl AppError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            Self::NotFound => (StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE.to_string()),
            Self::Shortener(ShortenerError::InvalidInput(message)) => {
                (StatusCode::BAD_REQUEST, message.clone())
            }
            Self::Shortener(ShortenerError::SlugConflict(_)) => {
                (StatusCode::CONFLICT, SLUG_TAKEN_MESSAGE.to_string())
            }
            Self::Shortener(ShortenerError::CapacityExhausted { attempts }) => {
                warn!(attempts, "short code space exhausted");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Could not allocate a short URL, please try again".to_string(),
                )
            }
            Self::Shortener(ShortenerError::Storage(source)) => {
                error!(error = %source, "storage failure while handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_MESSAGE.to_string(),
                )
            }
            Self::Redirector(RedirectorError::Storage(source)) => {
                error!(error = %source, "storage failure while resolving link");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_MESSAGE.to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_message();
        (status, Json(ErrorResponse { error })).into_response()
    }
}
