//! `POST /set_strategy`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use faas_scheduler::ReusePolicy;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SetStrategyRequest {
    strategy: String,
}

pub async fn set_strategy(
    State(state): State<AppState>,
    Json(request): Json<SetStrategyRequest>,
) -> Result<StatusCode, ApiError> {
    let policy: ReusePolicy = request.strategy.parse()?;
    state.scheduler.set_strategy(policy);
    Ok(StatusCode::OK)
}
