//! Per-function container pool.
//!
//! Enforces the reuse-policy contract and the concurrency cap for a single
//! function. Every race between invocation, completion, queueing, and
//! reclamation is resolved here, under a single `parking_lot::Mutex` guarding
//! the pool's bookkeeping. The mutex is never held across an `.await` point:
//! async work (launching, invoking, destroying containers) always happens
//! after the guard is dropped, using values copied or moved out of it first.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::oneshot;

use faas_error::Error;
use faas_runtime::{ContainerHandle, ContainerId, ContainerRuntime};

use crate::container::{Container, ContainerState};
use crate::strategy::ReusePolicy;

/// How many times a cold launch is retried (beyond the first attempt)
/// before giving up and failing the request. See the design notes: bounded
/// at one retry so a persistently broken image fails fast instead of
/// starving the queue behind endless relaunch attempts.
pub const MAX_LAUNCH_RETRIES: u32 = 1;

/// What `acquire` handed the caller.
pub enum Acquired {
    /// An idle container was reused; no launch was necessary.
    Warm(ContainerHandle),
    /// A new container was launched to serve this request.
    Cold(ContainerHandle),
    /// No capacity was free; the caller is queued and must await the
    /// returned receiver for a direct handoff from a future `release`.
    Queued(oneshot::Receiver<Result<Handoff, Error>>),
}

/// How a queued waiter was ultimately served, so the caller can classify
/// it exactly as it would an `Acquired::Warm`/`Acquired::Cold` result.
pub enum Handoff {
    /// Handed a still-running container directly from `release`, without
    /// it ever touching `idle`.
    Warm(ContainerHandle),
    /// The container it was waiting on died; a replacement was launched on
    /// its behalf.
    Cold(ContainerHandle),
}

/// The health a released container is reported with.
pub enum ReleaseOutcome {
    /// The invocation completed (successfully or with a non-2xx response);
    /// the container itself is still usable.
    Healthy,
    /// The container is presumed dead (transport failure) and must be
    /// discarded rather than returned to `idle`.
    Dead,
}

struct Waiter {
    sender: oneshot::Sender<Result<Handoff, Error>>,
}

struct Inner {
    /// Idle containers in ascending `last_used_at` order: front is oldest
    /// (LRU candidate), back is newest (MRU candidate).
    idle: VecDeque<Container>,
    busy: HashMap<ContainerId, Container>,
    /// Reserved capacity slots for containers that are launching but have
    /// no handle yet (the `Starting` state from `ContainerState`).
    starting: usize,
    queue: VecDeque<Waiter>,
    shutting_down: bool,
}

/// A single function's container pool.
pub struct Pool {
    function_id: String,
    image: String,
    concurrency_cap: usize,
    runtime: Arc<dyn ContainerRuntime>,
    inner: Mutex<Inner>,
    /// Snapshot-only counters, read without the main lock for `/stats`.
    idle_count: AtomicUsize,
    busy_count: AtomicUsize,
}

/// A point-in-time view of a pool's occupancy, for the stats endpoint.
#[derive(Debug, Clone, Copy)]
pub struct PoolSnapshot {
    pub idle: usize,
    pub busy: usize,
    pub starting: usize,
    pub queue_depth: usize,
    pub concurrency_cap: usize,
}

impl Pool {
    /// Create an empty pool for `function_id`.
    #[must_use]
    pub fn new(
        function_id: impl Into<String>,
        image: impl Into<String>,
        concurrency_cap: usize,
        runtime: Arc<dyn ContainerRuntime>,
    ) -> Self {
        Self {
            function_id: function_id.into(),
            image: image.into(),
            concurrency_cap,
            runtime,
            inner: Mutex::new(Inner {
                idle: VecDeque::new(),
                busy: HashMap::new(),
                starting: 0,
                queue: VecDeque::new(),
                shutting_down: false,
            }),
            idle_count: AtomicUsize::new(0),
            busy_count: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn function_id(&self) -> &str {
        &self.function_id
    }

    /// Acquire a container for one invocation, applying `policy` to pick
    /// which idle container to reuse if any are available. Reads `policy`
    /// fresh on every call so a strategy change takes effect on the very
    /// next acquisition.
    pub async fn acquire(&self, policy: ReusePolicy) -> Result<Acquired, Error> {
        enum Decision {
            Warm(ContainerHandle),
            NeedsLaunch,
            Queued(oneshot::Receiver<Result<ContainerHandle, Error>>),
            ShuttingDown,
        }

        let decision = {
            let mut inner = self.inner.lock();
            if inner.shutting_down {
                Decision::ShuttingDown
            } else if let Some(container) = Self::pop_idle(&mut inner, policy) {
                let handle = container.handle.clone();
                inner.busy.insert(handle.id, container);
                self.sync_counts(&inner);
                Decision::Warm(handle)
            } else if inner.busy.len() + inner.starting < self.concurrency_cap {
                inner.starting += 1;
                self.sync_counts(&inner);
                Decision::NeedsLaunch
            } else {
                let (tx, rx) = oneshot::channel();
                inner.queue.push_back(Waiter { sender: tx });
                Decision::Queued(rx)
            }
        };

        match decision {
            Decision::ShuttingDown => Err(Error::PoolShuttingDown {
                function_id: self.function_id.clone(),
            }),
            Decision::Warm(handle) => Ok(Acquired::Warm(handle)),
            Decision::Queued(rx) => Ok(Acquired::Queued(rx)),
            Decision::NeedsLaunch => match self.launch_with_retry().await {
                Ok(handle) => {
                    let container = Container::new_busy(handle.clone(), Instant::now());
                    let mut inner = self.inner.lock();
                    inner.starting -= 1;
                    inner.busy.insert(handle.id, container);
                    self.sync_counts(&inner);
                    Ok(Acquired::Cold(handle))
                }
                Err(err) => {
                    let mut inner = self.inner.lock();
                    inner.starting -= 1;
                    self.sync_counts(&inner);
                    Err(err)
                }
            },
        }
    }

    /// Release a container back to the pool after an invocation completes.
    ///
    /// Three outcomes, in priority order: a dead container is discarded and,
    /// if a waiter is queued, a replacement is launched for it; a healthy
    /// container with a waiter queued is handed directly to that waiter
    /// without ever touching `idle`; otherwise the container returns to
    /// `idle`.
    pub async fn release(&self, handle: ContainerHandle, outcome: ReleaseOutcome) {
        match outcome {
            ReleaseOutcome::Dead => {
                let waiter = {
                    let mut inner = self.inner.lock();
                    inner.busy.remove(&handle.id);
                    let waiter = inner.queue.pop_front();
                    if waiter.is_some() {
                        // Reserve the slot the dead container just vacated for
                        // its replacement, exactly as the cold-start path in
                        // `acquire` does, so a concurrent `acquire` can't also
                        // see free capacity and launch into it.
                        inner.starting += 1;
                    }
                    self.sync_counts(&inner);
                    waiter
                };
                self.runtime.destroy(&handle).await;

                if let Some(waiter) = waiter {
                    match self.launch_with_retry().await {
                        Ok(new_handle) => {
                            let container = Container::new_busy(new_handle.clone(), Instant::now());
                            let mut inner = self.inner.lock();
                            inner.starting -= 1;
                            inner.busy.insert(new_handle.id, container);
                            self.sync_counts(&inner);
                            let _ = waiter.sender.send(Ok(Handoff::Cold(new_handle)));
                        }
                        Err(err) => {
                            let mut inner = self.inner.lock();
                            inner.starting -= 1;
                            self.sync_counts(&inner);
                            let _ = waiter.sender.send(Err(err));
                        }
                    }
                }
            }
            ReleaseOutcome::Healthy => {
                let mut inner = self.inner.lock();
                if let Some(waiter) = inner.queue.pop_front() {
                    if let Some(container) = inner.busy.get_mut(&handle.id) {
                        container.mark_busy_via_handoff();
                    }
                    self.sync_counts(&inner);
                    drop(inner);
                    let _ = waiter.sender.send(Ok(Handoff::Warm(handle)));
                } else if let Some(mut container) = inner.busy.remove(&handle.id) {
                    container.mark_idle(Instant::now());
                    inner.idle.push_back(container);
                    self.sync_counts(&inner);
                }
            }
        }
    }

    /// Reclaim idle containers that have been idle at least `warm_time`.
    /// Scans from the front of `idle` (oldest first) and stops at the first
    /// container still within its warm window, since the deque stays sorted
    /// by `last_used_at`. Returns the number of containers destroyed.
    pub async fn sweep(&self, now: Instant, warm_time: Duration) -> usize {
        let expired = {
            let mut inner = self.inner.lock();
            let mut expired = Vec::new();
            while let Some(front) = inner.idle.front() {
                if now.saturating_duration_since(front.last_used_at) >= warm_time {
                    let container = inner.idle.pop_front().expect("front just peeked");
                    expired.push(container.handle);
                } else {
                    break;
                }
            }
            self.sync_counts(&inner);
            expired
        };

        for handle in &expired {
            self.runtime.destroy(handle).await;
        }
        expired.len()
    }

    /// Mark the pool as shutting down: further `acquire` calls fail
    /// immediately, and every currently-queued waiter is woken with an
    /// error rather than left to hang.
    pub fn shutdown(&self) {
        let mut inner = self.inner.lock();
        inner.shutting_down = true;
        while let Some(waiter) = inner.queue.pop_front() {
            let _ = waiter.sender.send(Err(Error::PoolShuttingDown {
                function_id: self.function_id.clone(),
            }));
        }
    }

    /// Point-in-time occupancy snapshot for `/stats`.
    #[must_use]
    pub fn snapshot(&self) -> PoolSnapshot {
        let inner = self.inner.lock();
        PoolSnapshot {
            idle: inner.idle.len(),
            busy: inner.busy.len(),
            starting: inner.starting,
            queue_depth: inner.queue.len(),
            concurrency_cap: self.concurrency_cap,
        }
    }

    fn pop_idle(inner: &mut Inner, policy: ReusePolicy) -> Option<Container> {
        match policy {
            ReusePolicy::Lru => inner.idle.pop_front(),
            ReusePolicy::Mru => inner.idle.pop_back(),
        }
    }

    fn sync_counts(&self, inner: &Inner) {
        self.idle_count.store(inner.idle.len(), Ordering::Relaxed);
        self.busy_count.store(inner.busy.len(), Ordering::Relaxed);
    }

    async fn launch_with_retry(&self) -> Result<ContainerHandle, Error> {
        let mut attempts = 0;
        loop {
            match self.runtime.launch(&self.image, &self.function_id).await {
                Ok(handle) => return Ok(handle),
                Err(reason) if attempts < MAX_LAUNCH_RETRIES => {
                    attempts += 1;
                    tracing::warn!(
                        function_id = %self.function_id,
                        attempt = attempts,
                        error = %reason,
                        "retrying container launch"
                    );
                }
                Err(reason) => {
                    return Err(Error::LaunchFailed {
                        function_id: self.function_id.clone(),
                        reason: reason.to_string(),
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faas_runtime::MockRuntime;
    use pretty_assertions::assert_eq;

    fn pool(cap: usize) -> Pool {
        Pool::new("fn-a", "scratch-image", cap, Arc::new(MockRuntime::default()))
    }

    #[tokio::test]
    async fn cold_start_then_warm_reuse() {
        let pool = pool(2);

        let handle = match pool.acquire(ReusePolicy::Lru).await.unwrap() {
            Acquired::Cold(h) => h,
            _ => panic!("expected a cold start on an empty pool"),
        };
        pool.release(handle.clone(), ReleaseOutcome::Healthy).await;

        match pool.acquire(ReusePolicy::Lru).await.unwrap() {
            Acquired::Warm(h) => assert_eq!(h.id, handle.id),
            _ => panic!("expected the released container to be reused warm"),
        }
    }

    #[tokio::test]
    async fn queues_beyond_concurrency_cap() {
        let pool = Arc::new(pool(1));

        let first = match pool.acquire(ReusePolicy::Lru).await.unwrap() {
            Acquired::Cold(h) => h,
            _ => panic!("expected a cold start"),
        };

        let rx = match pool.acquire(ReusePolicy::Lru).await.unwrap() {
            Acquired::Queued(rx) => rx,
            _ => panic!("expected the second acquire to queue at cap 1"),
        };

        let pool2 = Arc::clone(&pool);
        let releaser = tokio::spawn(async move {
            pool2.release(first, ReleaseOutcome::Healthy).await;
        });

        let handed_off = rx.await.unwrap().unwrap();
        releaser.await.unwrap();
        assert_eq!(pool.snapshot().busy, 1);
        assert!(matches!(handed_off, Handoff::Warm(_)), "a healthy release should hand off warm");
    }

    #[tokio::test]
    async fn dead_release_relaunches_for_a_queued_waiter_without_overcommitting() {
        let pool = Arc::new(pool(1));

        let first = match pool.acquire(ReusePolicy::Lru).await.unwrap() {
            Acquired::Cold(h) => h,
            _ => panic!("expected a cold start"),
        };

        let rx = match pool.acquire(ReusePolicy::Lru).await.unwrap() {
            Acquired::Queued(rx) => rx,
            _ => panic!("expected the second acquire to queue at cap 1"),
        };

        let pool2 = Arc::clone(&pool);
        let releaser = tokio::spawn(async move {
            pool2.release(first, ReleaseOutcome::Dead).await;
        });

        let handed_off = rx.await.unwrap().unwrap();
        releaser.await.unwrap();
        assert!(matches!(handed_off, Handoff::Cold(_)), "a relaunch-on-death handoff should be cold");
        assert_eq!(pool.snapshot().busy, 1, "the relaunch must not overcommit past the cap");
    }

    #[rstest::rstest]
    #[case::lru(ReusePolicy::Lru)]
    #[case::mru(ReusePolicy::Mru)]
    #[tokio::test]
    async fn policy_picks_the_expected_end_of_idle(#[case] policy: ReusePolicy) {
        let pool = pool(3);

        let a = match pool.acquire(policy).await.unwrap() {
            Acquired::Cold(h) => h,
            _ => panic!(),
        };
        let b = match pool.acquire(policy).await.unwrap() {
            Acquired::Cold(h) => h,
            _ => panic!(),
        };
        pool.release(a.clone(), ReleaseOutcome::Healthy).await;
        pool.release(b.clone(), ReleaseOutcome::Healthy).await;

        let expected = match policy {
            ReusePolicy::Lru => a.id,
            ReusePolicy::Mru => b.id,
        };
        match pool.acquire(policy).await.unwrap() {
            Acquired::Warm(h) => assert_eq!(h.id, expected),
            _ => panic!("expected a warm reuse"),
        }
    }

    #[tokio::test]
    async fn dead_release_does_not_return_to_idle() {
        let pool = pool(1);

        let handle = match pool.acquire(ReusePolicy::Lru).await.unwrap() {
            Acquired::Cold(h) => h,
            _ => panic!(),
        };
        pool.release(handle, ReleaseOutcome::Dead).await;

        assert_eq!(pool.snapshot().idle, 0);
        assert_eq!(pool.snapshot().busy, 0);
    }

    #[tokio::test]
    async fn sweep_reclaims_only_expired_containers() {
        tokio::time::pause();
        let pool = pool(2);

        let a = match pool.acquire(ReusePolicy::Lru).await.unwrap() {
            Acquired::Cold(h) => h,
            _ => panic!(),
        };
        pool.release(a, ReleaseOutcome::Healthy).await;

        tokio::time::advance(Duration::from_secs(10)).await;

        let b = match pool.acquire(ReusePolicy::Lru).await.unwrap() {
            Acquired::Cold(h) => h,
            _ => panic!(),
        };
        pool.release(b, ReleaseOutcome::Healthy).await;

        let reclaimed = pool.sweep(Instant::now(), Duration::from_secs(5)).await;
        assert_eq!(reclaimed, 1, "only the older container should have exceeded warm_time");
        assert_eq!(pool.snapshot().idle, 1);
    }

    #[tokio::test]
    async fn shutdown_fails_queued_waiters() {
        let pool = pool(1);
        let _first = match pool.acquire(ReusePolicy::Lru).await.unwrap() {
            Acquired::Cold(h) => h,
            _ => panic!(),
        };
        let rx = match pool.acquire(ReusePolicy::Lru).await.unwrap() {
            Acquired::Queued(rx) => rx,
            _ => panic!("expected to queue at cap 1"),
        };

        pool.shutdown();
        assert!(rx.await.unwrap().is_err());
    }
}
