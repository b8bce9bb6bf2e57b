//! Driver configuration.
//!
//! Configuration is read from TOML. Every field has a default, so an empty
//! file (or no file at all) yields a working setup:
//!
//! ```toml
//! [driver]
//! settle_delay_ms = 1010
//! notification_period = 100
//!
//! [events]
//! capacity = 100
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::events::DEFAULT_EVENT_CAPACITY;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Per-device driver settings.
    pub driver: DriverConfig,
    /// Event bus settings.
    pub events: EventsConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Read {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        Self::parse(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.as_ref().to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            source: e,
        })
    }

    /// Validate the configuration and return any errors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = self.driver.validate();
        errors.extend(self.events.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Load and validate configuration from a file.
    pub fn load_validated<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }
}

/// Settings applied to every device driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Wait between switching a sensor on and its first valid read, in
    /// milliseconds. SensorTag sensors sample once per second by default.
    pub settle_delay_ms: u64,
    /// Notification period written before subscribing, in units of 10 ms.
    pub notification_period: u8,
}

/// Smallest notification period the SensorTag firmware accepts (100 ms).
pub const MIN_NOTIFICATION_PERIOD: u8 = 10;

/// Largest settling delay accepted, in milliseconds.
pub const MAX_SETTLE_DELAY_MS: u64 = 10_000;

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 1010,
            notification_period: 100,
        }
    }
}

impl DriverConfig {
    /// Settling delay as a duration.
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Validate driver configuration.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.settle_delay_ms > MAX_SETTLE_DELAY_MS {
            errors.push(ValidationError {
                field: "driver.settle_delay_ms".to_string(),
                message: format!(
                    "settle delay {} ms exceeds {} ms",
                    self.settle_delay_ms, MAX_SETTLE_DELAY_MS
                ),
            });
        }
        if self.notification_period < MIN_NOTIFICATION_PERIOD {
            errors.push(ValidationError {
                field: "driver.notification_period".to_string(),
                message: format!(
                    "notification period must be at least {} (100 ms)",
                    MIN_NOTIFICATION_PERIOD
                ),
            });
        }

        errors
    }
}

/// Event bus settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Capacity of the broadcast channel.
    pub capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl EventsConfig {
    /// Validate event settings.
    pub fn validate(&self) -> Vec<ValidationError> {
        if self.capacity == 0 {
            vec![ValidationError {
                field: "events.capacity".to_string(),
                message: "capacity must be > 0".to_string(),
            }]
        } else {
            Vec::new()
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Default configuration file location.
///
/// `$SENSORLINK_CONFIG` wins; otherwise `sensorlink.toml` in the working
/// directory.
pub fn default_config_path() -> PathBuf {
    std::env::var_os("SENSORLINK_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sensorlink.toml"))
}
