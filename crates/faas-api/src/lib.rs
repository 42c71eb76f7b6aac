//! HTTP surface for the scheduler: routes, handlers, and the app state they
//! share. The scheduler core in `faas-scheduler` never depends on this
//! crate; this crate only translates HTTP in and out of it.

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::create_router;
pub use state::AppState;
