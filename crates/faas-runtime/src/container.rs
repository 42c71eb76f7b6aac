//! Handle types returned by a [`crate::ContainerRuntime`].
//!
//! These are the runtime adapter's view of a container: just enough to
//! address and invoke it. The scheduler wraps a `ContainerHandle` with its
//! own lifecycle state (see `faas_scheduler::container::Container`); the
//! adapter itself is stateless about pooling.

use std::fmt;

use uuid::Uuid;

/// Opaque container identifier, assigned by the runtime at launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerId(Uuid);

impl ContainerId {
    /// Generate a fresh, random container id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ContainerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A reachable launched container: its id, the function it serves, and the
/// address used to invoke it.
#[derive(Debug, Clone)]
pub struct ContainerHandle {
    /// The runtime-assigned identifier.
    pub id: ContainerId,
    /// The function this container was launched for.
    pub function_id: String,
    /// Host:port (or equivalent) the adapter invokes this container on.
    pub endpoint: String,
}

/// The response from a successful [`crate::ContainerRuntime::invoke`] call.
#[derive(Debug, Clone)]
pub struct InvokeResponse {
    /// Upstream HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: Vec<u8>,
}
