use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;
use validator::ValidationError;

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// No open feed has this identifier.
    #[error("feed {0} not found")]
    FeedNotFound(Uuid),
    /// The registry already holds the configured maximum of feeds.
    #[error("too many open feeds (limit {limit})")]
    TooManyFeeds { limit: usize },
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        let message = err
            .message
            .map(|message| message.into_owned())
            .unwrap_or_else(|| err.code.into_owned());
        ServiceError::InvalidInput(message)
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Service unavailable or saturated.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            err @ ServiceError::FeedNotFound(_) => AppError::NotFound(err.to_string()),
            err @ ServiceError::TooManyFeeds { .. } => AppError::ServiceUnavailable(err.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_http_statuses() {
        let cases = [
            (ServiceError::InvalidInput("page_size".into()), StatusCode::BAD_REQUEST),
            (ServiceError::FeedNotFound(Uuid::nil()), StatusCode::NOT_FOUND),
            (ServiceError::TooManyFeeds { limit: 2 }, StatusCode::SERVICE_UNAVAILABLE),
        ];

        for (err, expected) in cases {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn validation_error_message_becomes_input_error() {
        let mut err = ValidationError::new("page_size_range");
        err.message = Some("page_size must be between 1 and 5".into());
        match ServiceError::from(err) {
            ServiceError::InvalidInput(message) => {
                assert_eq!(message, "page_size must be between 1 and 5")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
