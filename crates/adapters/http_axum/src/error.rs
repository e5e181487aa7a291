//! HTTP error response mapping.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use devreg_domain::error::{RegistryError, ValidationError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

/// Maps [`RegistryError`] to an HTTP response with appropriate status code.
pub struct ApiError(RegistryError);

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        Self(err)
    }
}

fn malformed(text: String) -> ApiError {
    ApiError(ValidationError::Malformed(text).into())
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        malformed(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        malformed(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        malformed(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            RegistryError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            // 400 rather than 409 for duplicate serial numbers.
            RegistryError::Conflict(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            RegistryError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            RegistryError::Unavailable(err) => (StatusCode::LOCKED, err.to_string()),
            RegistryError::Storage(err) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { detail: message })).into_response()
    }
}
