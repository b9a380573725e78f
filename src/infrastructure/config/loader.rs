use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::HiveConfig;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid max_concurrent_tasks: {0}. Must be between 1 and 100")]
    InvalidMaxConcurrentTasks(usize),

    #[error("Invalid max_drones_per_type: {0}. Must be at least 1")]
    InvalidMaxDronesPerType(usize),

    #[error("Invalid cost_revenue_multiplier: {0}. Must be positive")]
    InvalidCostRevenueMultiplier(f64),

    #[error("Invalid revenue_potential_factor: {0}. Must be positive")]
    InvalidRevenuePotentialFactor(f64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Hive name cannot be empty")]
    EmptyHiveName,
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .hive/config.yaml (project config)
    /// 3. .hive/local.yaml (project local overrides, optional)
    /// 4. Environment variables (HIVE_* prefix, highest priority)
    ///
    /// Configuration is project-local (pwd/.hive/) so multiple hives on one
    /// machine can carry different settings.
    pub fn load() -> Result<HiveConfig> {
        let config: HiveConfig = Figment::new()
            .merge(Serialized::defaults(HiveConfig::default()))
            .merge(Yaml::file(".hive/config.yaml"))
            .merge(Yaml::file(".hive/local.yaml"))
            .merge(Env::prefixed("HIVE_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<HiveConfig> {
        let config: HiveConfig = Figment::new()
            .merge(Serialized::defaults(HiveConfig::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &HiveConfig) -> Result<(), ConfigError> {
        if config.hive_name.is_empty() {
            return Err(ConfigError::EmptyHiveName);
        }

        if config.max_concurrent_tasks == 0 || config.max_concurrent_tasks > 100 {
            return Err(ConfigError::InvalidMaxConcurrentTasks(
                config.max_concurrent_tasks,
            ));
        }

        if config.replication.max_drones_per_type == 0 {
            return Err(ConfigError::InvalidMaxDronesPerType(
                config.replication.max_drones_per_type,
            ));
        }

        if config.replication.cost_revenue_multiplier <= 0.0 {
            return Err(ConfigError::InvalidCostRevenueMultiplier(
                config.replication.cost_revenue_multiplier,
            ));
        }

        if config.replication.revenue_potential_factor <= 0.0 {
            return Err(ConfigError::InvalidRevenuePotentialFactor(
                config.replication.revenue_potential_factor,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = HiveConfig::default();
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_drone_cap() {
        let mut config = HiveConfig::default();
        config.replication.max_drones_per_type = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxDronesPerType(0))
        ));
    }

    #[test]
    fn test_validate_rejects_nonpositive_multiplier() {
        let mut config = HiveConfig::default();
        config.replication.cost_revenue_multiplier = 0.0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidCostRevenueMultiplier(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_log_level() {
        let mut config = HiveConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogLevel(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_task_bounds() {
        let mut config = HiveConfig::default();
        config.max_concurrent_tasks = 0;
        assert!(ConfigLoader::validate(&config).is_err());

        config.max_concurrent_tasks = 101;
        assert!(ConfigLoader::validate(&config).is_err());
    }

    #[test]
    fn test_load_from_file_merges_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "hive_name: test-hive\nreplication:\n  min_queue_depth: 3"
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.hive_name, "test-hive");
        assert_eq!(config.replication.min_queue_depth, 3);
        // Untouched fields keep their defaults
        assert_eq!(config.replication.max_drones_per_type, 5);
    }

    #[test]
    fn test_load_from_file_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "replication:\n  max_drones_per_type: 0").unwrap();

        assert!(ConfigLoader::load_from_file(&path).is_err());
    }
}
