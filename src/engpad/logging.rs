use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Environment variable consulted for the default level when `RUST_LOG` is
/// not set.
pub const LOG_LEVEL_ENV: &str = "ENGPAD_LOG";

/// Configuration for diagnostic logging.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level used for the `engpad` target when `RUST_LOG` is not set.
    pub level: Level,
    /// Emit one JSON object per line instead of human-readable text.
    pub json_format: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            json_format: false,
        }
    }
}

impl LogConfig {
    /// Defaults, with the level taken from `ENGPAD_LOG` when it parses.
    pub fn from_env() -> Self {
        let level = std::env::var(LOG_LEVEL_ENV)
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(Level::WARN);
        Self {
            level,
            ..Self::default()
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("engpad={}", self.level)))
    }
}

/// Install the global subscriber. Logs go to stderr so command output on
/// stdout stays clean.
///
/// Calling this twice is harmless; the second call is ignored.
pub fn init_logging(config: &LogConfig) {
    let layer = if config.json_format {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_filter(config.filter())
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_filter(config.filter())
            .boxed()
    };

    let _ = tracing_subscriber::registry().with(layer).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_level_is_quiet() {
        let config = LogConfig::default();
        assert_eq!(config.level, Level::WARN);
        assert!(!config.json_format);
    }

    #[test]
    fn init_twice_does_not_panic() {
        init_logging(&LogConfig::default());
        init_logging(&LogConfig {
            level: Level::DEBUG,
            json_format: true,
        });
    }
}
