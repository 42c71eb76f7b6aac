//! Shared error types for the FaaS scheduler.
//!
//! One `Error` enum per crate boundary is the convention used throughout
//! this codebase; this crate holds the enum shared by the scheduler core
//! and the HTTP surface, so both can match on the same variants without a
//! dependency cycle back through `faas-runtime`.

use thiserror::Error;

/// Result type for scheduler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the scheduler core and the HTTP API built on top of it.
#[derive(Error, Debug)]
pub enum Error {
    /// The process configuration failed validation or failed to parse.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// `/set_strategy` was given a value that isn't `lru`, `mru`, or `lcs`.
    #[error("unknown reuse strategy: {0}")]
    UnknownStrategy(String),

    /// The pool for `function_id` is draining and rejects new acquisitions.
    #[error("pool for function '{function_id}' is shutting down")]
    PoolShuttingDown {
        /// The function whose pool is draining.
        function_id: String,
    },

    /// A container could not be launched for `function_id`, even after retry.
    #[error("failed to launch container for function '{function_id}': {reason}")]
    LaunchFailed {
        /// The function that needed a new container.
        function_id: String,
        /// Human-readable failure reason from the runtime adapter.
        reason: String,
    },

    /// The container died mid-invocation (transport-level failure).
    #[error("invocation transport failure for function '{function_id}': {reason}")]
    InvokeTransport {
        /// The function being invoked.
        function_id: String,
        /// Human-readable failure reason from the runtime adapter.
        reason: String,
    },

    /// An invariant of the pool/scheduler was violated; should never happen
    /// in practice, but is surfaced rather than panicking so the process
    /// stays up.
    #[error("internal scheduler error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn configuration_error_displays_message() {
        let err = Error::Configuration("warm_time must be > 0".to_string());
        assert_eq!(
            err.to_string(),
            "configuration error: warm_time must be > 0"
        );
    }

    #[test]
    fn unknown_strategy_displays_value() {
        let err = Error::UnknownStrategy("fifo".to_string());
        assert_eq!(err.to_string(), "unknown reuse strategy: fifo");
    }

    #[test]
    fn launch_failed_names_the_function() {
        let err = Error::LaunchFailed {
            function_id: "a".to_string(),
            reason: "start-timeout".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to launch container for function 'a': start-timeout"
        );
    }
}
