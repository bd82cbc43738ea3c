//! HTTP mapping for `TodoError`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use todo_core::{ErrorResponse, TodoError};
use tracing::error;

/// A failed request: the operation's failure message plus its cause.
#[derive(Debug)]
pub struct ApiError {
    pub context: &'static str,
    pub source: TodoError,
}

impl ApiError {
    pub fn new(context: &'static str, source: TodoError) -> Self {
        Self { context, source }
    }

    pub fn status(&self) -> StatusCode {
        match self.source {
            TodoError::MalformedInput(_) | TodoError::Validation(_) => StatusCode::BAD_REQUEST,
            TodoError::NotFound(_) => StatusCode::NOT_FOUND,
            TodoError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Attach a failure message to a `TodoError` result.
pub trait Context<T> {
    fn context(self, context: &'static str) -> Result<T, ApiError>;
}

impl<T> Context<T> for Result<T, TodoError> {
    fn context(self, context: &'static str) -> Result<T, ApiError> {
        self.map_err(|source| ApiError::new(context, source))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self.source {
            TodoError::Validation(message) => ErrorResponse {
                message: message.clone(),
                error: None,
            },
            TodoError::MalformedInput(_) | TodoError::NotFound(_) => ErrorResponse {
                message: self.source.to_string(),
                error: None,
            },
            TodoError::Storage(cause) => {
                error!(error = %cause, "{}", self.context);
                ErrorResponse {
                    message: self.context.to_string(),
                    error: Some(cause.clone()),
                }
            }
        };
        (status, Json(body)).into_response()
    }
}
