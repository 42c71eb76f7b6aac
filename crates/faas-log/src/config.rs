//! Logging configuration presets, mirroring this codebase's env-driven
//! logging config elsewhere (`NEBULA_LOG` / `RUST_LOG`).

/// Configuration consumed by [`crate::init`].
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// `EnvFilter` directive string, e.g. `"info"` or `"faas_scheduler=debug,info"`.
    pub level: String,
    /// Whether to colorize output (disable for production / non-tty).
    pub ansi: bool,
    /// Emit newline-delimited JSON instead of the compact human format.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            ansi: true,
            json: false,
        }
    }
}

impl LogConfig {
    /// Build a config from `RUST_LOG` and `FAAS_LOG_FORMAT`, falling back to
    /// [`LogConfig::default`] for anything unset.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.level = level;
        }

        if let Ok(format) = std::env::var("FAAS_LOG_FORMAT") {
            match format.to_lowercase().as_str() {
                "json" => {
                    config.json = true;
                    config.ansi = false;
                }
                "plain" => config.ansi = false,
                _ => {}
            }
        }

        config
    }

    /// Preset tuned for local development: debug level, colored output.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            ansi: true,
            json: false,
        }
    }

    /// Preset tuned for production: info level, JSON, no color codes.
    #[must_use]
    pub fn production() -> Self {
        Self {
            level: "info".to_string(),
            ansi: false,
            json: true,
        }
    }
}
