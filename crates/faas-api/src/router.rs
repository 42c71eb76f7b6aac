//! Routes the HTTP surface onto the handlers, with request tracing layered
//! on top the same way this codebase's other axum services do.

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{health, invoke, stats, strategy};
use crate::state::AppState;

/// Build the full router for `state`.
#[must_use]
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/invoke/:function_id", get(invoke::invoke))
        .route("/set_strategy", post(strategy::set_strategy))
        .route("/stats", get(stats::stats))
        .route("/stats/reset", post(stats::reset_stats))
        .route("/healthz", get(health::healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
