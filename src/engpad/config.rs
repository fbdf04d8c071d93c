use crate::error::{NotepadError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

const CONFIG_FILENAME: &str = "config.json";

const DEFAULT_SHORT_DELAY_MS: u64 = 1_000;
const DEFAULT_MEDIUM_DELAY_MS: u64 = 2_000;
const DEFAULT_LONG_DELAY_MS: u64 = 3_000;
const DEFAULT_SWEEP_INTERVAL_MS: u64 = 5_000;

/// Autosave tuning, stored in `<data dir>/config.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct NotepadConfig {
    /// Debounce for documents under 10,000 characters.
    #[serde(default = "default_short_delay")]
    pub short_delay_ms: u64,

    /// Debounce for documents under 100,000 characters.
    #[serde(default = "default_medium_delay")]
    pub medium_delay_ms: u64,

    /// Debounce for everything larger.
    #[serde(default = "default_long_delay")]
    pub long_delay_ms: u64,

    /// How often the backup sweep looks for dirty documents without a timer.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_ms: u64,
}

fn default_short_delay() -> u64 {
    DEFAULT_SHORT_DELAY_MS
}

fn default_medium_delay() -> u64 {
    DEFAULT_MEDIUM_DELAY_MS
}

fn default_long_delay() -> u64 {
    DEFAULT_LONG_DELAY_MS
}

fn default_sweep_interval() -> u64 {
    DEFAULT_SWEEP_INTERVAL_MS
}

impl Default for NotepadConfig {
    fn default() -> Self {
        Self {
            short_delay_ms: DEFAULT_SHORT_DELAY_MS,
            medium_delay_ms: DEFAULT_MEDIUM_DELAY_MS,
            long_delay_ms: DEFAULT_LONG_DELAY_MS,
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
        }
    }
}

impl NotepadConfig {
    pub const KEYS: [&'static str; 4] = [
        "short-delay-ms",
        "medium-delay-ms",
        "long-delay-ms",
        "sweep-interval-ms",
    ];

    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: NotepadConfig = serde_json::from_str(&content)?;
        config.validate().map_err(NotepadError::Config)?;
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();
        fs::create_dir_all(config_dir)?;

        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_dir.join(CONFIG_FILENAME), content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "short-delay-ms" => Some(self.short_delay_ms.to_string()),
            "medium-delay-ms" => Some(self.medium_delay_ms.to_string()),
            "long-delay-ms" => Some(self.long_delay_ms.to_string()),
            "sweep-interval-ms" => Some(self.sweep_interval_ms.to_string()),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), String> {
        let parsed: u64 = value
            .trim()
            .parse()
            .map_err(|_| format!("{} must be a whole number of milliseconds", key))?;
        let mut next = self.clone();
        match key {
            "short-delay-ms" => next.short_delay_ms = parsed,
            "medium-delay-ms" => next.medium_delay_ms = parsed,
            "long-delay-ms" => next.long_delay_ms = parsed,
            "sweep-interval-ms" => next.sweep_interval_ms = parsed,
            _ => return Err(format!("Unknown config key: {}", key)),
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Delays must be positive and must not shrink as documents grow.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.short_delay_ms == 0 || self.sweep_interval_ms == 0 {
            return Err("delays must be greater than zero".to_string());
        }
        if self.short_delay_ms > self.medium_delay_ms || self.medium_delay_ms > self.long_delay_ms
        {
            return Err("delays must satisfy short <= medium <= long".to_string());
        }
        Ok(())
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}
