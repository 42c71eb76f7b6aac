//! Scheduler configuration: TOML file with environment-variable overrides.
//!
//! Precedence is environment > file > built-in default, resolved field by
//! field rather than whole-document: a file can set `warm_time_secs` and
//! still have `FAAS_BIND_ADDR` override just the bind address.

use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use faas_error::{Error, Result};

use crate::strategy::ReusePolicy;

const ENV_PREFIX: &str = "FAAS_";

/// Fully resolved scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// How long a container may sit idle before the janitor reclaims it.
    pub warm_time: Duration,
    /// How often the janitor wakes to sweep every pool.
    pub janitor_sleep: Duration,
    /// Concurrency cap applied to a pool created on first dispatch to an
    /// unrecognized function id.
    pub default_concurrency_cap: usize,
    /// Pools to create eagerly at startup, with their own pinned caps.
    pub preconfigured_pools: HashMap<String, usize>,
    /// Container image passed to every `launch` call.
    pub image: String,
    /// Reuse strategy in effect at startup.
    pub initial_strategy: ReusePolicy,
    /// Address the HTTP surface binds to.
    pub bind_addr: String,
    /// `MockRuntime` invoke latency, when running against the mock.
    pub mock_invoke_latency_ms: u64,
    /// `MockRuntime` launch latency, when running against the mock.
    pub mock_launch_latency_ms: u64,
}

/// Raw, partially-specified form as read from a TOML file. Every field is
/// optional so a file only needs to mention what it overrides.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    warm_time_secs: Option<u64>,
    janitor_sleep_secs: Option<u64>,
    default_concurrency_cap: Option<usize>,
    #[serde(default)]
    preconfigured_pools: HashMap<String, usize>,
    image: Option<String>,
    initial_strategy: Option<String>,
    bind_addr: Option<String>,
    mock_invoke_latency_ms: Option<u64>,
    mock_launch_latency_ms: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            warm_time: Duration::from_secs(20),
            janitor_sleep: Duration::from_secs(5),
            default_concurrency_cap: 3,
            preconfigured_pools: HashMap::new(),
            image: "scratch".to_string(),
            initial_strategy: ReusePolicy::Lru,
            bind_addr: "127.0.0.1:8080".to_string(),
            mock_invoke_latency_ms: 5,
            mock_launch_latency_ms: 20,
        }
    }
}

impl SchedulerConfig {
    /// Load configuration: start from [`SchedulerConfig::default`], apply
    /// `path` if it exists, then apply `FAAS_*` environment overrides.
    /// Returns an error if the file fails to parse or a resolved value is
    /// invalid (e.g. a zero concurrency cap).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::default();

        let path = path.as_ref();
        if path.exists() {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| Error::Configuration(format!("reading {}: {e}", path.display())))?;
            let raw: RawConfig = toml::from_str(&raw)
                .map_err(|e| Error::Configuration(format!("parsing {}: {e}", path.display())))?;
            config.apply_raw(raw)?;
        }

        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_raw(&mut self, raw: RawConfig) -> Result<()> {
        if let Some(v) = raw.warm_time_secs {
            self.warm_time = Duration::from_secs(v);
        }
        if let Some(v) = raw.janitor_sleep_secs {
            self.janitor_sleep = Duration::from_secs(v);
        }
        if let Some(v) = raw.default_concurrency_cap {
            self.default_concurrency_cap = v;
        }
        if !raw.preconfigured_pools.is_empty() {
            self.preconfigured_pools = raw.preconfigured_pools;
        }
        if let Some(v) = raw.image {
            self.image = v;
        }
        if let Some(v) = raw.initial_strategy {
            self.initial_strategy = v.parse()?;
        }
        if let Some(v) = raw.bind_addr {
            self.bind_addr = v;
        }
        if let Some(v) = raw.mock_invoke_latency_ms {
            self.mock_invoke_latency_ms = v;
        }
        if let Some(v) = raw.mock_launch_latency_ms {
            self.mock_launch_latency_ms = v;
        }
        Ok(())
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(v) = env_var("WARM_TIME_SECS")? {
            self.warm_time = Duration::from_secs(parse_env("WARM_TIME_SECS", &v)?);
        }
        if let Some(v) = env_var("JANITOR_SLEEP_SECS")? {
            self.janitor_sleep = Duration::from_secs(parse_env("JANITOR_SLEEP_SECS", &v)?);
        }
        if let Some(v) = env_var("DEFAULT_CONCURRENCY_CAP")? {
            self.default_concurrency_cap = parse_env("DEFAULT_CONCURRENCY_CAP", &v)?;
        }
        if let Some(v) = env_var("IMAGE")? {
            self.image = v;
        }
        if let Some(v) = env_var("INITIAL_STRATEGY")? {
            self.initial_strategy = v.parse()?;
        }
        if let Some(v) = env_var("BIND_ADDR")? {
            self.bind_addr = v;
        }
        if let Some(v) = env_var("MOCK_INVOKE_LATENCY_MS")? {
            self.mock_invoke_latency_ms = parse_env("MOCK_INVOKE_LATENCY_MS", &v)?;
        }
        if let Some(v) = env_var("MOCK_LAUNCH_LATENCY_MS")? {
            self.mock_launch_latency_ms = parse_env("MOCK_LAUNCH_LATENCY_MS", &v)?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.default_concurrency_cap == 0 {
            return Err(Error::Configuration(
                "default_concurrency_cap must be at least 1".to_string(),
            ));
        }
        if self.preconfigured_pools.values().any(|&cap| cap == 0) {
            return Err(Error::Configuration(
                "preconfigured pool concurrency caps must be at least 1".to_string(),
            ));
        }
        if self.image.is_empty() {
            return Err(Error::Configuration("image must not be empty".to_string()));
        }
        Ok(())
    }

    /// A config suitable for fast, deterministic tests: short timings and
    /// no preconfigured pools.
    #[cfg(test)]
    #[must_use]
    pub fn test_defaults() -> Self {
        Self {
            warm_time: Duration::from_millis(100),
            janitor_sleep: Duration::from_millis(20),
            mock_invoke_latency_ms: 0,
            mock_launch_latency_ms: 0,
            ..Self::default()
        }
    }
}

fn env_var(suffix: &str) -> Result<Option<String>> {
    match env::var(format!("{ENV_PREFIX}{suffix}")) {
        Ok(v) => Ok(Some(v)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(Error::Configuration(format!(
            "{ENV_PREFIX}{suffix} is not valid unicode"
        ))),
    }
}

fn parse_env<T: std::str::FromStr>(suffix: &str, raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| Error::Configuration(format!("{ENV_PREFIX}{suffix}='{raw}' is not valid")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_sane() {
        let config = SchedulerConfig::default();
        assert_eq!(config.default_concurrency_cap, 3);
        assert_eq!(config.initial_strategy, ReusePolicy::Lru);
    }

    #[test]
    fn zero_concurrency_cap_is_rejected() {
        let mut config = SchedulerConfig::default();
        config.default_concurrency_cap = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_falls_back_to_defaults_when_file_is_absent() {
        let config = SchedulerConfig::load("/nonexistent/faas.toml").unwrap();
        assert_eq!(config.default_concurrency_cap, 3);
    }

    #[test]
    fn raw_config_overrides_named_fields_only() {
        let mut config = SchedulerConfig::default();
        config
            .apply_raw(RawConfig {
                default_concurrency_cap: Some(9),
                ..RawConfig::default()
            })
            .unwrap();
        assert_eq!(config.default_concurrency_cap, 9);
        assert_eq!(config.image, SchedulerConfig::default().image);
    }
}
