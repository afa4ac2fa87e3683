//! Uniform JSON error responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use nodes::{AgentError, WorkflowError};
use pipeline::{LifecycleError, StoreError};
use serde::Serialize;
use tracing::error;

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

/// An error answered as `{ "success": false, "error": message }`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(status = self.status.as_u16(), error = %self.message, "request failed");
        }
        let body = ErrorBody {
            success: false,
            error: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let status = match &err {
            StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            StoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            StoreError::Rejected(_) | StoreError::Codec(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        let status = match &err {
            LifecycleError::IllegalTransition { .. } => StatusCode::CONFLICT,
            LifecycleError::UnknownAction(_) | LifecycleError::UnknownStatus(_) => {
                StatusCode::BAD_REQUEST
            }
        };
        Self::new(status, err.to_string())
    }
}

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Store(err) => err.into(),
            AgentError::Lifecycle(err) => err.into(),
        }
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::EmptyPrompt => Self::bad_request(err.to_string()),
            WorkflowError::Generation(failure) => Self::internal(failure.error),
            WorkflowError::Store(err) => err.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline::BlogStatus;

    #[test]
    fn store_errors_map_to_statuses() {
        let cases = [
            (StoreError::not_found("blogs", "x"), StatusCode::NOT_FOUND),
            (StoreError::Unavailable("down".into()), StatusCode::SERVICE_UNAVAILABLE),
            (StoreError::Codec("bad".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn lifecycle_errors_map_to_statuses() {
        let illegal = LifecycleError::IllegalTransition {
            from: BlogStatus::Published,
            to: BlogStatus::Draft,
        };
        assert_eq!(ApiError::from(illegal).status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::from(LifecycleError::UnknownAction("ARCHIVE".into())).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
