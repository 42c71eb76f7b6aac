//! Container runtime adapter.
//!
//! Abstracts the local container engine behind a small capability interface:
//! *launch*, *invoke*, *destroy*. The scheduler core never talks to Docker,
//! Firecracker, or any other engine directly — it only ever talks to this
//! trait, which is intentionally stateless about pooling, concurrency, or
//! reuse policy. Those concerns live in `faas-scheduler`.

pub mod container;
pub mod error;
pub mod mock;

pub use container::{ContainerHandle, ContainerId, InvokeResponse};
pub use error::{InvokeError, LaunchError};
pub use mock::{MockRuntime, MockRuntimeConfig};

use async_trait::async_trait;

/// The capability set a container engine must provide.
///
/// Implementations must be safe to call from many concurrent contexts —
/// the scheduler never serializes calls into this trait, and a single
/// `ContainerRuntime` instance is shared (via `Arc`) across every pool.
#[async_trait]
pub trait ContainerRuntime: Send + Sync + 'static {
    /// Start a container from `image` specialized for `function_id`, and
    /// block until it has been health-probed and is reachable.
    async fn launch(
        &self,
        image: &str,
        function_id: &str,
    ) -> Result<ContainerHandle, LaunchError>;

    /// Send a single request/response invocation to an already-launched
    /// container.
    async fn invoke(
        &self,
        handle: &ContainerHandle,
        payload: &[u8],
    ) -> Result<InvokeResponse, InvokeError>;

    /// Best-effort stop and remove. Idempotent; never raises to the caller
    /// (failures are logged internally by the implementation).
    async fn destroy(&self, handle: &ContainerHandle);
}
