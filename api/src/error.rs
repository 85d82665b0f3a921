use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use stockcast::StockcastError;

/// Error type for dashboard API responses
#[derive(Debug)]
pub enum ApiError {
    /// The request was understood but no forecast can be produced for it
    Unprocessable(String),
    NotFound(String),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unprocessable(msg) => write!(f, "{msg}"),
            Self::NotFound(msg) => write!(f, "not_found: {msg}"),
            Self::Internal(msg) => write!(f, "internal_error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_str = match self {
            Self::Unprocessable(msg) | Self::NotFound(msg) | Self::Internal(msg) => msg,
        };

        let body = json!({ "error": error_str });
        (status, axum::Json(body)).into_response()
    }
}

impl From<StockcastError> for ApiError {
    fn from(e: StockcastError) -> Self {
        match e {
            StockcastError::InsufficientData { .. } | StockcastError::Fit(_) => {
                Self::Unprocessable(e.to_string())
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<askama::Error> for ApiError {
    fn from(e: askama::Error) -> Self {
        Self::Internal(format!("template: {e}"))
    }
}
