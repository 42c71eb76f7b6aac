//! Logging setup for the FaaS scheduler.
//!
//! A single `Registry + EnvFilter + fmt` composition, initialized once at
//! process startup. Kept deliberately small: there is no telemetry exporter
//! here (out of scope for the scheduler core), but logging itself is never
//! stubbed out.

mod config;

pub use config::LogConfig;

use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// RAII guard returned by [`init`]. Dropping it does nothing today (there is
/// no background writer to flush), but it keeps the call site symmetric with
/// the rest of this codebase's `init() -> Guard` logging convention, and
/// gives us a place to hang a `WorkerGuard` if file output is ever added.
#[derive(Debug)]
pub struct LogGuard {
    _private: (),
}

/// Initialize the global tracing subscriber from `config`.
///
/// Safe to call at most once per process; a second call will panic, matching
/// `tracing_subscriber`'s own `set_global_default` contract.
pub fn init(config: &LogConfig) -> LogGuard {
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(config.ansi)
        .with_level(true);

    if config.json {
        let subscriber = Registry::default().with(filter).with(fmt_layer.json());
        subscriber.init();
    } else {
        let subscriber = Registry::default().with(filter).with(fmt_layer);
        subscriber.init();
    }

    LogGuard { _private: () }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_config_is_info_and_ansi() {
        let config = LogConfig::default();
        assert_eq!(config.level, "info");
        assert!(config.ansi);
        assert!(!config.json);
    }

    #[test]
    fn from_env_falls_back_to_default_without_rust_log() {
        // SAFETY: test-only, single-threaded access to the process env var
        // within this test's scope; no other test in this crate touches it.
        unsafe {
            std::env::remove_var("RUST_LOG");
        }
        let config = LogConfig::from_env();
        assert_eq!(config.level, "info");
    }
}
