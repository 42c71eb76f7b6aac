//! `GET /stats` and `POST /stats/reset`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use faas_scheduler::StatsView;

use crate::state::AppState;

#[derive(Serialize)]
pub struct StatsResponse {
    total_cold_starts: u64,
    total_warm_starts: u64,
    total_requests_queued: u64,
    total_requests_failed: u64,
    strategy: &'static str,
    per_function: std::collections::HashMap<String, FunctionStatsResponse>,
}

#[derive(Serialize)]
pub struct FunctionStatsResponse {
    cold_starts: u64,
    warm_starts: u64,
    requests_queued: u64,
    requests_failed: u64,
    idle: usize,
    busy: usize,
    queue_depth: usize,
    concurrency_cap: usize,
}

impl From<StatsView> for StatsResponse {
    fn from(view: StatsView) -> Self {
        let per_function = view
            .functions
            .into_iter()
            .map(|f| {
                (
                    f.function_id,
                    FunctionStatsResponse {
                        cold_starts: f.cold_starts,
                        warm_starts: f.warm_starts,
                        requests_queued: f.requests_queued,
                        requests_failed: f.requests_failed,
                        idle: f.idle,
                        busy: f.busy,
                        queue_depth: f.queue_depth,
                        concurrency_cap: f.concurrency_cap,
                    },
                )
            })
            .collect();

        Self {
            total_cold_starts: view.global.cold_starts,
            total_warm_starts: view.global.warm_starts,
            total_requests_queued: view.global.requests_queued,
            total_requests_failed: view.global.requests_failed,
            strategy: view.strategy,
            per_function,
        }
    }
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.scheduler.stats_view().into())
}

pub async fn reset_stats(State(state): State<AppState>) -> StatusCode {
    state.scheduler.reset_stats();
    StatusCode::OK
}
