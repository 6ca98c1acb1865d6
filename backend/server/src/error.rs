use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use records::{StoreError, validate::ValidationError};
use thiserror::Error;
use tracing::error;

use crate::roles::TransitionError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Missing or expired session")]
    Unauthorized,

    #[error("Invalid username or password")]
    BadCredentials,

    #[error("Forbidden: {0}")]
    Forbidden(&'static str),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("{0} {1} not found")]
    NotFound(&'static str, u64),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::MalformedPayload(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::MalformedPayload { .. } | AppError::Invalid { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized | AppError::BadCredentials => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. } | AppError::Transition { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Store { .. } => {
                error!("{self}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, self.to_string()).into_response()
    }
}
