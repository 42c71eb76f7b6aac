//! Cold-start-aware container pooling and request dispatch for a single
//! FaaS worker node.
//!
//! [`registry::Scheduler`] owns one [`pool::Pool`] per function id and
//! dispatches invocations through it; [`janitor::Janitor`] reclaims idle
//! containers on a timer; [`lease::ContainerLease`] guarantees a container
//! is released back to its pool exactly once even under cancellation.

pub mod config;
pub mod container;
pub mod janitor;
pub mod lease;
pub mod pool;
pub mod registry;
pub mod stats;
pub mod strategy;

pub use config::SchedulerConfig;
pub use janitor::Janitor;
pub use lease::ContainerLease;
pub use pool::{Acquired, Pool, PoolSnapshot, ReleaseOutcome, MAX_LAUNCH_RETRIES};
pub use registry::{FunctionStatsView, Scheduler, StatsView};
pub use strategy::ReusePolicy;
