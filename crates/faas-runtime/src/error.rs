//! Errors raised by a [`crate::ContainerRuntime`] implementation.

use thiserror::Error;

use crate::container::ContainerId;

/// Failure modes for [`crate::ContainerRuntime::launch`].
#[derive(Error, Debug, Clone)]
pub enum LaunchError {
    /// The requested image does not exist / could not be pulled.
    #[error("image '{image}' is missing")]
    ImageMissing {
        /// The image reference that could not be found.
        image: String,
    },
    /// The container did not come up within the allotted time.
    #[error("container for '{function_id}' did not start in time")]
    StartTimeout {
        /// The function the container was being started for.
        function_id: String,
    },
    /// The container started but never passed its health probe.
    #[error("health probe failed for container of '{function_id}': {reason}")]
    HealthProbeFailed {
        /// The function the container was being started for.
        function_id: String,
        /// Why the probe failed.
        reason: String,
    },
}

/// Failure modes for [`crate::ContainerRuntime::invoke`].
#[derive(Error, Debug, Clone)]
pub enum InvokeError {
    /// The connection to the container was lost or refused; the container
    /// is presumed dead and must not be returned to the pool's idle set.
    #[error("transport error invoking container {container_id}: {reason}")]
    Transport {
        /// The container that could not be reached.
        container_id: ContainerId,
        /// Underlying transport failure description.
        reason: String,
    },
    /// The container responded, but with a non-2xx status. The container
    /// itself is healthy and may be reused.
    #[error("function returned non-2xx status {status}")]
    NonSuccess {
        /// The upstream HTTP status code.
        status: u16,
        /// The response body, if any, for surfacing to the caller.
        body: String,
    },
}

impl InvokeError {
    /// Whether this failure indicates the container itself died (as
    /// opposed to the function merely returning an error response).
    #[must_use]
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, InvokeError::Transport { .. })
    }
}
