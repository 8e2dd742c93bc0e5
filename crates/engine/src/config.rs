use serde::Deserialize;

use domain::services::PushRecipient;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub push: PushConfig,
    #[serde(default)]
    pub realtime: RealtimeConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Alerting thresholds and sweep cadence. All externally tunable; sweep
/// intervals are expected to sit well below the thresholds they police.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// Age after which an unresolved geofence alert is promoted to urgent.
    #[serde(default = "default_escalation_threshold_secs")]
    pub escalation_threshold_secs: u64,

    /// Silence after which a collar counts as offline.
    #[serde(default = "default_offline_threshold_minutes")]
    pub offline_threshold_minutes: u64,

    /// Silence under which an offline alert is cleared. The gap up to
    /// `offline_threshold_minutes` is a dead zone that damps flapping.
    #[serde(default = "default_recovery_threshold_minutes")]
    pub recovery_threshold_minutes: u64,

    /// Battery level at or below which connectivity loss is attributed
    /// to the battery, not the network.
    #[serde(default = "default_low_battery_floor_percent")]
    pub low_battery_floor_percent: i32,

    /// Escalation sweep interval.
    #[serde(default = "default_escalation_sweep_secs")]
    pub escalation_sweep_secs: u64,

    /// Connectivity sweep interval.
    #[serde(default = "default_connectivity_sweep_secs")]
    pub connectivity_sweep_secs: u64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            escalation_threshold_secs: default_escalation_threshold_secs(),
            offline_threshold_minutes: default_offline_threshold_minutes(),
            recovery_threshold_minutes: default_recovery_threshold_minutes(),
            low_battery_floor_percent: default_low_battery_floor_percent(),
            escalation_sweep_secs: default_escalation_sweep_secs(),
            connectivity_sweep_secs: default_connectivity_sweep_secs(),
        }
    }
}

/// Push channel configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PushConfig {
    /// Whether real deliveries happen; disabled wiring logs instead.
    #[serde(default)]
    pub enabled: bool,

    /// Configured recipients; identity is opaque to the engine.
    #[serde(default)]
    pub recipients: Vec<PushRecipient>,

    /// Per-request delivery timeout.
    #[serde(default = "default_push_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            recipients: Vec::new(),
            timeout_ms: default_push_timeout_ms(),
        }
    }
}

/// Real-time broadcast configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    /// Broadcast channel capacity; slow subscribers past this lag drop
    /// events rather than applying backpressure.
    #[serde(default = "default_realtime_capacity")]
    pub channel_capacity: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_realtime_capacity(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_escalation_threshold_secs() -> u64 {
    120
}
fn default_offline_threshold_minutes() -> u64 {
    10
}
fn default_recovery_threshold_minutes() -> u64 {
    5
}
fn default_low_battery_floor_percent() -> i32 {
    20
}
fn default_escalation_sweep_secs() -> u64 {
    15
}
fn default_connectivity_sweep_secs() -> u64 {
    30
}
fn default_push_timeout_ms() -> u64 {
    5000
}
fn default_realtime_capacity() -> usize {
    256
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with CT__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("CT").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides, without
    /// touching the filesystem.
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [logging]
            level = "info"
            format = "json"

            [monitoring]
            escalation_threshold_secs = 120
            offline_threshold_minutes = 10
            recovery_threshold_minutes = 5
            low_battery_floor_percent = 20
            escalation_sweep_secs = 15
            connectivity_sweep_secs = 30

            [push]
            enabled = false
            recipients = []
            timeout_ms = 5000

            [realtime]
            channel_capacity = 256
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<(), ConfigValidationError> {
        let m = &self.monitoring;

        if m.recovery_threshold_minutes > m.offline_threshold_minutes {
            return Err(ConfigValidationError::InvalidValue(
                "recovery_threshold_minutes cannot exceed offline_threshold_minutes".to_string(),
            ));
        }

        if m.escalation_sweep_secs == 0 || m.connectivity_sweep_secs == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "sweep intervals must be non-zero".to_string(),
            ));
        }

        if m.escalation_sweep_secs >= m.escalation_threshold_secs {
            return Err(ConfigValidationError::InvalidValue(
                "escalation_sweep_secs must be below escalation_threshold_secs".to_string(),
            ));
        }

        if !(0..=100).contains(&m.low_battery_floor_percent) {
            return Err(ConfigValidationError::InvalidValue(
                "low_battery_floor_percent must be between 0 and 100".to_string(),
            ));
        }

        if self.push.enabled && self.push.recipients.is_empty() {
            return Err(ConfigValidationError::InvalidValue(
                "push.enabled requires at least one recipient".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_load_with_defaults() {
        let config = Config::load_for_test(&[]).expect("Failed to load config");

        assert_eq!(config.monitoring.escalation_threshold_secs, 120);
        assert_eq!(config.monitoring.offline_threshold_minutes, 10);
        assert_eq!(config.monitoring.recovery_threshold_minutes, 5);
        assert_eq!(config.monitoring.low_battery_floor_percent, 20);
        assert_eq!(config.logging.level, "info");
        assert!(!config.push.enabled);
    }

    #[test]
    fn test_config_override() {
        let config = Config::load_for_test(&[
            ("monitoring.escalation_threshold_secs", "300"),
            ("logging.level", "debug"),
        ])
        .expect("Failed to load config");

        assert_eq!(config.monitoring.escalation_threshold_secs, 300);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_config_rejects_inverted_dead_zone() {
        let result = Config::load_for_test(&[
            ("monitoring.recovery_threshold_minutes", "15"),
            ("monitoring.offline_threshold_minutes", "10"),
        ]);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("recovery_threshold_minutes"));
    }

    #[test]
    fn test_config_rejects_sweep_slower_than_threshold() {
        let result = Config::load_for_test(&[
            ("monitoring.escalation_sweep_secs", "120"),
            ("monitoring.escalation_threshold_secs", "120"),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_rejects_push_without_recipients() {
        let result = Config::load_for_test(&[("push.enabled", "true")]);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("recipient"));
    }

    #[test]
    fn test_config_rejects_battery_floor_out_of_range() {
        let result = Config::load_for_test(&[("monitoring.low_battery_floor_percent", "150")]);
        assert!(result.is_err());
    }
}
