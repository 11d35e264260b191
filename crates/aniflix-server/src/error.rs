use aniflix_core::error::CoreError;
use aniflix_runtime::{ResolveError, RuntimeError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Error body of the episode endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// HTTP-facing errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Episode not found")]
    NotFound,

    /// The client went away; nobody reads the response.
    #[error("request cancelled")]
    Cancelled,
}

impl From<ResolveError> for AppError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NotFound(reason) => {
                tracing::debug!(%reason, "Episode not found");
                AppError::NotFound
            }
            ResolveError::Cancelled => AppError::Cancelled,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => {
                let body = Json(ErrorResponse {
                    error: self.to_string(),
                });
                (StatusCode::NOT_FOUND, body).into_response()
            }
            AppError::Cancelled => {
                tracing::debug!("Resolution cancelled");
                StatusCode::SERVICE_UNAVAILABLE.into_response()
            }
        }
    }
}

/// Errors that end the `aniflix` process.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] CoreError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
