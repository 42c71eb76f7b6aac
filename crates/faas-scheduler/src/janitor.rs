//! Background reclamation loop.
//!
//! Wakes every `janitor_sleep` interval, sweeps every pool for containers
//! idle past `warm_time`, and destroys them. Shuts down cooperatively via a
//! [`CancellationToken`] rather than aborting the task outright, so a sweep
//! already in flight finishes cleanly.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::registry::Scheduler;

/// Handle to a running janitor task.
pub struct Janitor {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl Janitor {
    /// Spawn the reclamation loop against `scheduler`.
    #[must_use]
    pub fn spawn(scheduler: Arc<Scheduler>, warm_time: Duration, janitor_sleep: Duration) -> Self {
        let token = CancellationToken::new();
        let loop_token = token.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = loop_token.cancelled() => {
                        tracing::info!("janitor shutting down");
                        break;
                    }
                    _ = tokio::time::sleep(janitor_sleep) => {
                        let reclaimed = scheduler.sweep_all(warm_time).await;
                        if reclaimed > 0 {
                            tracing::debug!(reclaimed, "janitor reclaimed idle containers");
                        }
                    }
                }
            }
        });

        Self { token, handle }
    }

    /// Signal the loop to stop after its current sweep and wait for it to
    /// exit.
    pub async fn shutdown(self) {
        self.token.cancel();
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulerConfig;
    use faas_runtime::MockRuntime;

    #[tokio::test]
    async fn sweep_reclaims_idle_containers_on_schedule() {
        tokio::time::pause();

        let config = SchedulerConfig {
            warm_time: Duration::from_millis(50),
            ..SchedulerConfig::test_defaults()
        };
        let scheduler = Arc::new(Scheduler::new(&config, Arc::new(MockRuntime::default())));
        scheduler.dispatch("fn-a", b"warm it up").await.unwrap();

        let janitor = Janitor::spawn(Arc::clone(&scheduler), Duration::from_millis(50), Duration::from_millis(10));

        tokio::time::advance(Duration::from_millis(200)).await;
        tokio::task::yield_now().await;

        let view = scheduler.stats_view();
        let fn_a = view.functions.iter().find(|f| f.function_id == "fn-a").unwrap();
        assert_eq!(fn_a.idle, 0, "janitor should have reclaimed the idle container");

        janitor.shutdown().await;
    }
}
