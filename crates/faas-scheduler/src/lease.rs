//! RAII guard over an acquired container.
//!
//! `dispatch` cancellation (the client disconnects mid-invocation, or the
//! enclosing task is aborted) must not leak a container forever marked
//! busy. `ContainerLease` guarantees `Pool::release` fires exactly once:
//! on the happy path via the explicit [`ContainerLease::release`] call, or
//! on an early drop via the `Drop` impl below, which conservatively treats
//! an undetermined outcome as `Dead` rather than risk handing a
//! possibly-wedged container back out as warm.

use std::sync::Arc;

use faas_runtime::ContainerHandle;

use crate::pool::{Pool, ReleaseOutcome};

/// A container checked out from a [`Pool`], owed back exactly once.
pub struct ContainerLease {
    handle: Option<ContainerHandle>,
    pool: Arc<Pool>,
    function_id: String,
}

impl ContainerLease {
    /// Wrap an already-acquired handle. `pool` must be the same pool the
    /// handle was acquired from.
    #[must_use]
    pub fn new(handle: ContainerHandle, pool: Arc<Pool>, function_id: impl Into<String>) -> Self {
        Self {
            handle: Some(handle),
            pool,
            function_id: function_id.into(),
        }
    }

    /// Borrow the underlying handle for invocation.
    #[must_use]
    pub fn handle(&self) -> &ContainerHandle {
        self.handle.as_ref().expect("released lease reused")
    }

    /// Release the container with its observed outcome. Consumes the
    /// lease so a second release is a compile error, not a runtime bug.
    pub async fn release(mut self, outcome: ReleaseOutcome) {
        let handle = self.handle.take().expect("release called exactly once");
        self.pool.release(handle, outcome).await;
    }
}

impl Drop for ContainerLease {
    fn drop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        tracing::warn!(
            function_id = %self.function_id,
            container_id = %handle.id,
            "container lease dropped without an explicit release; discarding container"
        );
        let pool = Arc::clone(&self.pool);
        tokio::spawn(async move {
            pool.release(handle, ReleaseOutcome::Dead).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faas_runtime::MockRuntime;

    fn pool() -> Arc<Pool> {
        Arc::new(Pool::new("fn-a", "scratch", 1, Arc::new(MockRuntime::default())))
    }

    #[tokio::test]
    async fn explicit_release_returns_container_to_idle() {
        use crate::pool::Acquired;
        use crate::strategy::ReusePolicy;

        let pool = pool();
        let handle = match pool.acquire(ReusePolicy::Lru).await.unwrap() {
            Acquired::Cold(h) => h,
            _ => panic!(),
        };
        let lease = ContainerLease::new(handle, Arc::clone(&pool), "fn-a");
        lease.release(ReleaseOutcome::Healthy).await;

        assert_eq!(pool.snapshot().idle, 1);
    }

    #[tokio::test]
    async fn dropping_without_release_discards_the_container() {
        use crate::pool::Acquired;
        use crate::strategy::ReusePolicy;

        let pool = pool();
        let handle = match pool.acquire(ReusePolicy::Lru).await.unwrap() {
            Acquired::Cold(h) => h,
            _ => panic!(),
        };
        {
            let _lease = ContainerLease::new(handle, Arc::clone(&pool), "fn-a");
        }
        // The Drop-spawned release task needs a scheduling point to run.
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        assert_eq!(pool.snapshot().idle, 0);
        assert_eq!(pool.snapshot().busy, 0);
    }
}
