//! The scheduler: function-id-keyed pool registry plus the swappable reuse
//! strategy, tying dispatch, stats, and pool lifecycle together.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use dashmap::DashMap;
use serde::Serialize;

use faas_error::Error;
use faas_runtime::{ContainerRuntime, InvokeError, InvokeResponse};

use crate::config::SchedulerConfig;
use crate::lease::ContainerLease;
use crate::pool::{Acquired, Handoff, Pool, PoolSnapshot, ReleaseOutcome};
use crate::stats::{FunctionCountersSnapshot, Stats};
use crate::strategy::ReusePolicy;

/// Owns every per-function [`Pool`], the shared [`ContainerRuntime`], the
/// live-swappable [`ReusePolicy`], and the dispatch counters.
pub struct Scheduler {
    pools: DashMap<String, Arc<Pool>>,
    runtime: Arc<dyn ContainerRuntime>,
    strategy: ArcSwap<ReusePolicy>,
    image: String,
    default_concurrency_cap: usize,
    stats: Stats,
}

/// A single function's combined stats-endpoint view.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionStatsView {
    pub function_id: String,
    pub idle: usize,
    pub busy: usize,
    pub starting: usize,
    pub queue_depth: usize,
    pub concurrency_cap: usize,
    pub cold_starts: u64,
    pub warm_starts: u64,
    pub requests_queued: u64,
    pub requests_failed: u64,
}

/// Full `/stats` response body.
#[derive(Debug, Clone, Serialize)]
pub struct StatsView {
    pub strategy: &'static str,
    pub global: FunctionCountersSnapshot,
    pub functions: Vec<FunctionStatsView>,
}

impl Scheduler {
    /// Build a scheduler from `config`, preconfiguring any pools it names
    /// with their pinned concurrency caps.
    #[must_use]
    pub fn new(config: &SchedulerConfig, runtime: Arc<dyn ContainerRuntime>) -> Self {
        let scheduler = Self {
            pools: DashMap::new(),
            runtime,
            strategy: ArcSwap::from_pointee(config.initial_strategy),
            image: config.image.clone(),
            default_concurrency_cap: config.default_concurrency_cap,
            stats: Stats::new(),
        };

        for (function_id, cap) in &config.preconfigured_pools {
            scheduler.pools.insert(
                function_id.clone(),
                Arc::new(Pool::new(
                    function_id.clone(),
                    scheduler.image.clone(),
                    *cap,
                    Arc::clone(&scheduler.runtime),
                )),
            );
        }

        scheduler
    }

    /// The currently active reuse strategy.
    #[must_use]
    pub fn strategy(&self) -> ReusePolicy {
        **self.strategy.load()
    }

    /// Swap the active reuse strategy. Takes effect on the next `acquire`
    /// call for every pool; in-flight acquisitions already read their
    /// policy and are unaffected.
    pub fn set_strategy(&self, policy: ReusePolicy) {
        self.strategy.store(Arc::new(policy));
    }

    /// Get or lazily create the pool for `function_id`, atomically: two
    /// concurrent dispatches to an unseen function never create two pools.
    fn pool_for(&self, function_id: &str) -> Arc<Pool> {
        let cap = self.default_concurrency_cap;
        Arc::clone(self.pools.entry(function_id.to_string()).or_insert_with(|| {
            Arc::new(Pool::new(
                function_id.to_string(),
                self.image.clone(),
                cap,
                Arc::clone(&self.runtime),
            ))
        }))
    }

    /// Run one invocation of `function_id` with `payload` through to
    /// completion: acquire a container (warm, cold, or queued), invoke it,
    /// and release it with the outcome the invocation observed.
    pub async fn dispatch(
        &self,
        function_id: &str,
        payload: &[u8],
    ) -> Result<InvokeResponse, Error> {
        let pool = self.pool_for(function_id);
        let policy = self.strategy();

        let handle = match pool.acquire(policy).await {
            Ok(Acquired::Warm(handle)) => {
                self.stats.record_warm_start(function_id);
                handle
            }
            Ok(Acquired::Cold(handle)) => {
                self.stats.record_cold_start(function_id);
                handle
            }
            Ok(Acquired::Queued(rx)) => {
                self.stats.record_queued(function_id);
                match rx.await {
                    Ok(Ok(Handoff::Warm(handle))) => {
                        self.stats.record_warm_start(function_id);
                        handle
                    }
                    Ok(Ok(Handoff::Cold(handle))) => {
                        self.stats.record_cold_start(function_id);
                        handle
                    }
                    Ok(Err(err)) => {
                        self.stats.record_failed(function_id);
                        return Err(err);
                    }
                    Err(_) => {
                        self.stats.record_failed(function_id);
                        return Err(Error::Internal(
                            "queued waiter dropped without a reply".to_string(),
                        ));
                    }
                }
            }
            Err(err) => {
                self.stats.record_failed(function_id);
                return Err(err);
            }
        };

        let lease = ContainerLease::new(handle, Arc::clone(&pool), function_id);
        match self.runtime.invoke(lease.handle(), payload).await {
            Ok(response) => {
                lease.release(ReleaseOutcome::Healthy).await;
                Ok(response)
            }
            Err(InvokeError::NonSuccess { status, body }) => {
                lease.release(ReleaseOutcome::Healthy).await;
                Ok(InvokeResponse {
                    status,
                    body: body.into_bytes(),
                })
            }
            Err(err @ InvokeError::Transport { .. }) => {
                lease.release(ReleaseOutcome::Dead).await;
                self.stats.record_failed(function_id);
                Err(Error::InvokeTransport {
                    function_id: function_id.to_string(),
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Reclaim idle containers past `warm_time` across every pool. Called
    /// by the janitor loop, but exposed here for tests that want to drive
    /// reclamation without spawning a background task.
    pub async fn sweep_all(&self, warm_time: std::time::Duration) -> usize {
        let now = std::time::Instant::now();
        let pools: Vec<Arc<Pool>> = self.pools.iter().map(|e| Arc::clone(e.value())).collect();
        let mut total = 0;
        for pool in pools {
            total += pool.sweep(now, warm_time).await;
        }
        total
    }

    /// Combined stats-endpoint view across every pool that has ever been
    /// dispatched to or preconfigured.
    #[must_use]
    pub fn stats_view(&self) -> StatsView {
        let functions = self
            .pools
            .iter()
            .map(|entry| {
                let function_id = entry.key().clone();
                let PoolSnapshot {
                    idle,
                    busy,
                    starting,
                    queue_depth,
                    concurrency_cap,
                } = entry.value().snapshot();
                let counters = self.stats.function_snapshot(&function_id);
                FunctionStatsView {
                    function_id,
                    idle,
                    busy,
                    starting,
                    queue_depth,
                    concurrency_cap,
                    cold_starts: counters.cold_starts,
                    warm_starts: counters.warm_starts,
                    requests_queued: counters.requests_queued,
                    requests_failed: counters.requests_failed,
                }
            })
            .collect();

        StatsView {
            strategy: self.strategy().as_str(),
            global: self.stats.global_snapshot(),
            functions,
        }
    }

    /// Zero every counter. Pool occupancy (idle/busy/queue) is untouched —
    /// only the monotonic dispatch counters reset.
    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    /// The pinned concurrency caps a config preconfigured, keyed by
    /// function id. Exposed for diagnostics/tests only.
    #[must_use]
    pub fn known_function_ids(&self) -> Vec<String> {
        self.pools.iter().map(|e| e.key().clone()).collect()
    }

    /// Signal every pool to reject new acquisitions and wake queued
    /// waiters with an error, ahead of process shutdown.
    pub fn shutdown(&self) {
        for entry in &self.pools {
            entry.value().shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faas_runtime::MockRuntime;
    use pretty_assertions::assert_eq;

    fn scheduler() -> Scheduler {
        let config = SchedulerConfig {
            image: "scratch".to_string(),
            default_concurrency_cap: 2,
            preconfigured_pools: HashMap::new(),
            initial_strategy: ReusePolicy::Lru,
            ..SchedulerConfig::test_defaults()
        };
        Scheduler::new(&config, Arc::new(MockRuntime::default()))
    }

    #[tokio::test]
    async fn dispatch_creates_a_pool_on_first_use() {
        let scheduler = scheduler();
        let response = scheduler.dispatch("fn-a", b"hi").await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(scheduler.known_function_ids(), vec!["fn-a".to_string()]);
    }

    #[tokio::test]
    async fn second_dispatch_is_a_warm_start() {
        let scheduler = scheduler();
        scheduler.dispatch("fn-a", b"one").await.unwrap();
        scheduler.dispatch("fn-a", b"two").await.unwrap();

        let view = scheduler.stats_view();
        let fn_a = view.functions.iter().find(|f| f.function_id == "fn-a").unwrap();
        assert_eq!(fn_a.cold_starts, 1);
        assert_eq!(fn_a.warm_starts, 1);
    }

    #[tokio::test]
    async fn separate_function_ids_get_isolated_pools() {
        let scheduler = scheduler();
        scheduler.dispatch("fn-a", b"payload").await.unwrap();
        scheduler.dispatch("fn-b", b"payload").await.unwrap();

        let view = scheduler.stats_view();
        assert_eq!(view.functions.len(), 2);
        assert!(view.functions.iter().all(|f| f.cold_starts == 1));
    }

    #[tokio::test]
    async fn set_strategy_affects_the_next_dispatch() {
        let scheduler = scheduler();
        assert_eq!(scheduler.strategy(), ReusePolicy::Lru);
        scheduler.set_strategy(ReusePolicy::Mru);
        assert_eq!(scheduler.strategy(), ReusePolicy::Mru);
    }

    #[tokio::test]
    async fn reset_stats_zeroes_counters_but_not_occupancy() {
        let scheduler = scheduler();
        scheduler.dispatch("fn-a", b"payload").await.unwrap();
        scheduler.reset_stats();

        let view = scheduler.stats_view();
        let fn_a = view.functions.iter().find(|f| f.function_id == "fn-a").unwrap();
        assert_eq!(fn_a.cold_starts, 0);
    }
}
