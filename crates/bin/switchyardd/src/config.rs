//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `switchyard.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use serde::Deserialize;
use switchyard_app::watcher::WatcherSettings;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Watcher timing and toggles.
    pub watchers: WatchersConfig,
    /// Registry change bus settings.
    pub bus: BusConfig,
    /// Simulated services.
    pub demo: DemoConfig,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Watcher configuration, shared by every service type.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WatchersConfig {
    /// Pause between two ticks.
    pub poll_interval_secs: u64,
    /// Upper bound for a single service check.
    pub check_timeout_secs: u64,
    /// Run the invoice feed watcher.
    pub invoice_enabled: bool,
    /// Run the mailbox watcher.
    pub mailbox_enabled: bool,
}

/// Registry change bus configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Notifications buffered per subscriber before it lags.
    pub capacity: usize,
}

/// Demo configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Seed simulated services and recipes into an empty database.
    pub enabled: bool,
    /// Pause between two simulated remote activities.
    pub activity_interval_secs: u64,
}

impl Config {
    /// Load configuration from `switchyard.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if a
    /// value is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("switchyard.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SWITCHYARD_DATABASE_URL") {
            self.database.url = val;
        }
        if let Ok(val) = std::env::var("SWITCHYARD_POLL_INTERVAL_SECS") {
            if let Ok(secs) = val.parse() {
                self.watchers.poll_interval_secs = secs;
            }
        }
        if let Ok(val) = std::env::var("SWITCHYARD_CHECK_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                self.watchers.check_timeout_secs = secs;
            }
        }
        if let Ok(val) = std::env::var("SWITCHYARD_DEMO") {
            if let Ok(enabled) = val.parse() {
                self.demo.enabled = enabled;
            }
        }
        if let Ok(val) = std::env::var("SWITCHYARD_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.watchers.poll_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "poll interval must be non-zero".to_string(),
            ));
        }
        if self.watchers.check_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "check timeout must be non-zero".to_string(),
            ));
        }
        if self.bus.capacity == 0 {
            return Err(ConfigError::Validation(
                "bus capacity must be non-zero".to_string(),
            ));
        }
        if self.demo.enabled && self.demo.activity_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "demo activity interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// Timing shared by every watcher.
    #[must_use]
    pub fn watcher_settings(&self) -> WatcherSettings {
        WatcherSettings {
            interval: Duration::from_secs(self.watchers.poll_interval_secs),
            check_timeout: Duration::from_secs(self.watchers.check_timeout_secs),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:switchyard.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "switchyardd=info,switchyard=info".to_string(),
        }
    }
}

impl Default for WatchersConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
            check_timeout_secs: 30,
            invoice_enabled: true,
            mailbox_enabled: true,
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self { capacity: 256 }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            activity_interval_secs: 20,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
