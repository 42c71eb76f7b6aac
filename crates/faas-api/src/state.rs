//! Shared application state handed to every handler.

use std::sync::Arc;

use faas_scheduler::Scheduler;

/// Cloneable handle axum hands to every handler. Cheap to clone: it's just
/// an `Arc` around the scheduler.
#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<Scheduler>,
}

impl AppState {
    #[must_use]
    pub fn new(scheduler: Arc<Scheduler>) -> Self {
        Self { scheduler }
    }
}
