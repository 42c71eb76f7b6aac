//! Maps scheduler-core errors onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use faas_error::Error as CoreError;

/// Error type returned by handlers; wraps the scheduler's own error enum
/// and renders it as `{"error": "<message>"}` with the status the spec
/// assigns to each failure mode.
pub struct ApiError(CoreError);

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self(err)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CoreError::PoolShuttingDown { .. } => StatusCode::SERVICE_UNAVAILABLE,
            CoreError::UnknownStrategy(_) => StatusCode::BAD_REQUEST,
            CoreError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CoreError::LaunchFailed { .. }
            | CoreError::InvokeTransport { .. }
            | CoreError::Internal(_) => StatusCode::BAD_GATEWAY,
        };

        let body = ErrorBody {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
