use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::models::ErrorResponse;

/// RepositoryError
///
/// Failures raised by a `Repository` implementation. Handlers never expose these
/// to clients; they are folded into `ApiError::Internal` with a fixed message.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("owner {0} does not exist")]
    OwnerNotFound(Uuid),

    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// ApiError
///
/// The endpoint's error taxonomy. Each variant renders as `{"error": "<message>"}`
/// with its status code.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(&'static str),

    /// A failure the client cannot act on. `message` is the fixed client-facing text
    /// for the operation; `source` only reaches the logs.
    #[error("{message}")]
    Internal {
        message: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

pub const MISSING_FIELDS: &str = "Missing required fields";
pub const FETCH_FAILED: &str = "Failed to fetch comics";
pub const CREATE_FAILED: &str = "Failed to create comic";

/// Convenience type alias for handler return values.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Wraps a failure with the client-facing message for the operation.
    pub fn internal<E>(message: &'static str) -> impl FnOnce(E) -> ApiError
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        move |source| ApiError::Internal {
            message,
            source: Box::new(source),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal { message, source } = &self {
            // The source stays in the logs; the client only sees the fixed message.
            tracing::error!(error = %source, "{}", message);
        }

        let status = self.status();
        let body = ErrorResponse {
            error: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
