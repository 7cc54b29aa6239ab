//! Service configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use minebank_types::ACCRUAL_INTERVAL_SECS;
use minebank_utils::LogFormat;

use crate::ServiceError;

/// Configuration for the accrual service.
///
/// Can be loaded from a TOML file via [`ServiceConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Directory holding the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// How often the scheduler checks for elapsed intervals, in seconds.
    /// Must be shorter than the 300 s accrual interval to credit promptly.
    #[serde(default = "default_tick_cadence_secs")]
    pub tick_cadence_secs: u64,

    /// Buffered events per subscriber before slow subscribers start lagging.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// LMDB memory map size in bytes.
    #[serde(default = "default_lmdb_map_size")]
    pub lmdb_map_size: usize,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./minebank_data")
}

fn default_tick_cadence_secs() -> u64 {
    5
}

fn default_event_channel_capacity() -> usize {
    64
}

fn default_lmdb_map_size() -> usize {
    16 * 1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ServiceConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ServiceError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ServiceError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ServiceError> {
        let config: Self = toml::from_str(s).map_err(|e| ServiceError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ServiceError> {
        toml::to_string_pretty(self).map_err(|e| ServiceError::Config(e.to_string()))
    }

    /// Reject values the scheduler cannot run with.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.tick_cadence_secs == 0 {
            return Err(ServiceError::Config("tick_cadence_secs must be at least 1".into()));
        }
        if self.tick_cadence_secs >= ACCRUAL_INTERVAL_SECS {
            return Err(ServiceError::Config(format!(
                "tick_cadence_secs must be below the {ACCRUAL_INTERVAL_SECS}s accrual interval"
            )));
        }
        if self.event_channel_capacity == 0 {
            return Err(ServiceError::Config(
                "event_channel_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn tick_cadence(&self) -> Duration {
        Duration::from_secs(self.tick_cadence_secs)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            tick_cadence_secs: default_tick_cadence_secs(),
            event_channel_capacity: default_event_channel_capacity(),
            lmdb_map_size: default_lmdb_map_size(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = ServiceConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = ServiceConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = ServiceConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.tick_cadence_secs, 5);
        assert_eq!(config.event_channel_capacity, 64);
        assert_eq!(config.log_format, LogFormat::Human);
        assert_eq!(config.data_dir, PathBuf::from("./minebank_data"));
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            tick_cadence_secs = 2
            log_format = "json"
            data_dir = "/var/lib/minebank"
        "#;
        let config = ServiceConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.tick_cadence(), Duration::from_secs(2));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/minebank"));
        assert_eq!(config.log_level, "info"); // default
    }

    #[test]
    fn zero_cadence_is_rejected() {
        let err = ServiceConfig::from_toml_str("tick_cadence_secs = 0").unwrap_err();
        assert!(matches!(err, ServiceError::Config(_)));
    }

    #[test]
    fn cadence_must_stay_below_accrual_interval() {
        let err = ServiceConfig::from_toml_str("tick_cadence_secs = 300").unwrap_err();
        assert!(matches!(err, ServiceError::Config(_)));
        let config = ServiceConfig::from_toml_str("tick_cadence_secs = 299").unwrap();
        assert_eq!(config.tick_cadence(), Duration::from_secs(299));
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        assert!(ServiceConfig::from_toml_str("log_format = \"xml\"").is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("minebank.toml");
        std::fs::write(&path, "log_level = \"debug\"\n").unwrap();
        let config = ServiceConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.log_level, "debug");
    }
}
