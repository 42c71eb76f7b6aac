//! A runnable stand-in for a real container engine.
//!
//! The container runtime itself is out of scope for this repo (see the
//! spec's scope section): a real backend would shell out to Docker,
//! Firecracker, or gVisor. `MockRuntime` exists so the scheduler is runnable
//! and testable end-to-end without one, while staying behind the exact same
//! [`crate::ContainerRuntime`] seam a real backend would implement.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::container::{ContainerHandle, ContainerId, InvokeResponse};
use crate::error::{InvokeError, LaunchError};
use crate::ContainerRuntime;

/// Tuning knobs for [`MockRuntime`]. Meaningless against a real container
/// engine; only relevant to this mock.
#[derive(Debug, Clone)]
pub struct MockRuntimeConfig {
    /// Simulated time for a container to become reachable.
    pub launch_latency: Duration,
    /// Simulated time for a single invocation to complete.
    pub invoke_latency: Duration,
    /// Fraction (0.0–1.0) of invocations that simulate a transport failure,
    /// for exercising the pool's dead-container handling in tests.
    pub transport_failure_rate: f64,
}

impl Default for MockRuntimeConfig {
    fn default() -> Self {
        Self {
            launch_latency: Duration::from_millis(20),
            invoke_latency: Duration::from_millis(5),
            transport_failure_rate: 0.0,
        }
    }
}

/// An in-memory container runtime that never touches a real engine.
///
/// `launch` synthesizes a loopback endpoint after a configurable delay;
/// `invoke` echoes the payload back as the response body after a
/// configurable delay (optionally simulating a transport failure);
/// `destroy` is a no-op that only logs.
#[derive(Debug)]
pub struct MockRuntime {
    config: MockRuntimeConfig,
    /// Flipped once `fail_next_launch` is armed, so a single test can force
    /// exactly one launch failure and then let subsequent launches succeed.
    fail_next_launch: AtomicBool,
}

impl MockRuntime {
    /// Build a mock runtime with the given tuning.
    #[must_use]
    pub fn new(config: MockRuntimeConfig) -> Self {
        Self {
            config,
            fail_next_launch: AtomicBool::new(false),
        }
    }

    /// Arm the runtime to fail exactly the next `launch` call. Used by tests
    /// that exercise the pool's one-retry-then-fail launch policy.
    pub fn fail_next_launch(&self) {
        self.fail_next_launch.store(true, Ordering::SeqCst);
    }
}

impl Default for MockRuntime {
    fn default() -> Self {
        Self::new(MockRuntimeConfig::default())
    }
}

#[async_trait]
impl ContainerRuntime for MockRuntime {
    async fn launch(
        &self,
        image: &str,
        function_id: &str,
    ) -> Result<ContainerHandle, LaunchError> {
        if image.is_empty() {
            return Err(LaunchError::ImageMissing {
                image: image.to_string(),
            });
        }

        tokio::time::sleep(self.config.launch_latency).await;

        if self.fail_next_launch.swap(false, Ordering::SeqCst) {
            return Err(LaunchError::HealthProbeFailed {
                function_id: function_id.to_string(),
                reason: "simulated probe failure".to_string(),
            });
        }

        let id = ContainerId::new();
        tracing::debug!(%id, function_id, "mock container launched");
        Ok(ContainerHandle {
            id,
            function_id: function_id.to_string(),
            endpoint: format!("127.0.0.1:0#{id}"),
        })
    }

    async fn invoke(
        &self,
        handle: &ContainerHandle,
        payload: &[u8],
    ) -> Result<InvokeResponse, InvokeError> {
        tokio::time::sleep(self.config.invoke_latency).await;

        if self.config.transport_failure_rate > 0.0
            && rand::thread_rng().gen_bool(self.config.transport_failure_rate)
        {
            return Err(InvokeError::Transport {
                container_id: handle.id,
                reason: "simulated connection reset".to_string(),
            });
        }

        Ok(InvokeResponse {
            status: 200,
            body: payload.to_vec(),
        })
    }

    async fn destroy(&self, handle: &ContainerHandle) {
        tracing::debug!(id = %handle.id, "mock container destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn launch_rejects_empty_image() {
        let runtime = MockRuntime::default();
        let err = runtime.launch("", "fn-a").await.unwrap_err();
        assert!(matches!(err, LaunchError::ImageMissing { .. }));
    }

    #[tokio::test]
    async fn invoke_echoes_payload() {
        let runtime = MockRuntime::default();
        let handle = runtime.launch("scratch", "fn-a").await.unwrap();
        let response = runtime.invoke(&handle, b"hello").await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"hello");
    }

    #[tokio::test]
    async fn fail_next_launch_fails_exactly_once() {
        let runtime = MockRuntime::default();
        runtime.fail_next_launch();

        let first = runtime.launch("scratch", "fn-a").await;
        assert!(first.is_err());

        let second = runtime.launch("scratch", "fn-a").await;
        assert!(second.is_ok());
    }
}
