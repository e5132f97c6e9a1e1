//! Translation of registry failures into HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use casefile::core::error::{Outcome, RecordError};
use casefile::service::ServiceError;
use serde::Serialize;
use tracing::error;

/// Handler failure; renders as `{"status", "error", "message"}`.
#[derive(Debug)]
pub struct ApiError(ServiceError);

#[derive(Serialize)]
struct ErrorBody {
    status: u16,
    error: &'static str,
    message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ServiceError::Record(err) => match err.outcome() {
                Outcome::Validation => StatusCode::BAD_REQUEST,
                Outcome::NotFound | Outcome::ReferencedNotFound => StatusCode::NOT_FOUND,
            },
            ServiceError::AgentInUse { .. } => StatusCode::CONFLICT,
            ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

impl From<RecordError> for ApiError {
    fn from(err: RecordError) -> Self {
        Self(ServiceError::Record(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self.0, "request failed");
        }
        let body = ErrorBody {
            status: status.as_u16(),
            error: self.0.kind(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
