use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub const DENIED_MESSAGE: &str = "Operation not allowed!";

// Every failure a handler can report, each with a fixed status and shape
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("Operation not allowed!")]
    Denied,

    #[error("{0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Internal(#[from] sqlx::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Denied => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Denied => (status, DENIED_MESSAGE).into_response(),
            ApiError::Validation(message) | ApiError::NotFound(message) => {
                let error_response = json!({
                    "status": "fail",
                    "message": message,
                });
                (status, Json(error_response)).into_response()
            }
            ApiError::Internal(err) => {
                // Store details stay in the log
                tracing::error!(error = ?err, "database operation failed");
                let error_response = json!({
                    "status": "error",
                    "message": "Internal server error",
                });
                (status, Json(error_response)).into_response()
            }
        }
    }
}
