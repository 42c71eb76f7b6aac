//! `GET /invoke/{function_id}`.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;
use crate::state::AppState;

pub async fn invoke(
    State(state): State<AppState>,
    Path(function_id): Path<String>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let response = state.scheduler.dispatch(&function_id, &body).await?;
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::OK);
    Ok((status, response.body).into_response())
}
