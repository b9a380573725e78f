//! Configuration models for the hive.

use serde::{Deserialize, Serialize};

/// Main configuration structure for the hive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HiveConfig {
    /// Human-readable hive name
    #[serde(default = "default_hive_name")]
    pub hive_name: String,

    /// Maximum number of tasks executed concurrently in one cycle
    #[serde(default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: usize,

    /// Per-execution timeout hint passed to the execution layer, seconds
    #[serde(default = "default_task_timeout_secs")]
    pub task_timeout_secs: u64,

    /// Replication configuration
    #[serde(default)]
    pub replication: ReplicationConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_hive_name() -> String {
    "default-hive".to_string()
}

const fn default_max_concurrent_tasks() -> usize {
    10
}

const fn default_task_timeout_secs() -> u64 {
    300
}

impl Default for HiveConfig {
    fn default() -> Self {
        Self {
            hive_name: default_hive_name(),
            max_concurrent_tasks: default_max_concurrent_tasks(),
            task_timeout_secs: default_task_timeout_secs(),
            replication: ReplicationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration for drone self-replication.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReplicationConfig {
    /// Minimum pending-queue depth before replication is considered
    #[serde(default = "default_min_queue_depth")]
    pub min_queue_depth: usize,

    /// Maximum number of live drones per type
    #[serde(default = "default_max_drones_per_type")]
    pub max_drones_per_type: usize,

    /// Only replicate if revenue potential exceeds cost times this multiplier
    #[serde(default = "default_cost_revenue_multiplier")]
    pub cost_revenue_multiplier: f64,

    /// Cooldown between successful spawns, seconds
    #[serde(default = "default_replication_cooldown_secs")]
    pub replication_cooldown_secs: u64,

    /// Factor applied to realized revenue when estimating revenue potential
    #[serde(default = "default_revenue_potential_factor")]
    pub revenue_potential_factor: f64,

    /// Estimated cost of one pool operation, used as the cost baseline
    #[serde(default = "default_operation_cost")]
    pub operation_cost: f64,

    /// Initial number of worker drones
    #[serde(default = "default_initial_workers")]
    pub initial_workers: usize,

    /// Initial number of builder drones
    #[serde(default = "default_initial_builders")]
    pub initial_builders: usize,

    /// Initial number of seller drones
    #[serde(default)]
    pub initial_sellers: usize,

    /// Initial number of researcher drones
    #[serde(default = "default_initial_researchers")]
    pub initial_researchers: usize,

    /// Initial number of analyst drones
    #[serde(default)]
    pub initial_analysts: usize,
}

const fn default_min_queue_depth() -> usize {
    10
}

const fn default_max_drones_per_type() -> usize {
    5
}

const fn default_cost_revenue_multiplier() -> f64 {
    2.0
}

const fn default_replication_cooldown_secs() -> u64 {
    300
}

const fn default_revenue_potential_factor() -> f64 {
    1.5
}

const fn default_operation_cost() -> f64 {
    0.01
}

const fn default_initial_workers() -> usize {
    1
}

const fn default_initial_builders() -> usize {
    1
}

const fn default_initial_researchers() -> usize {
    1
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            min_queue_depth: default_min_queue_depth(),
            max_drones_per_type: default_max_drones_per_type(),
            cost_revenue_multiplier: default_cost_revenue_multiplier(),
            replication_cooldown_secs: default_replication_cooldown_secs(),
            revenue_potential_factor: default_revenue_potential_factor(),
            operation_cost: default_operation_cost(),
            initial_workers: default_initial_workers(),
            initial_builders: default_initial_builders(),
            initial_sellers: 0,
            initial_researchers: default_initial_researchers(),
            initial_analysts: 0,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Optional directory for file output with daily rotation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HiveConfig::default();
        assert_eq!(config.hive_name, "default-hive");
        assert_eq!(config.max_concurrent_tasks, 10);
        assert_eq!(config.replication.min_queue_depth, 10);
        assert_eq!(config.replication.max_drones_per_type, 5);
        assert!((config.replication.cost_revenue_multiplier - 2.0).abs() < f64::EPSILON);
        assert_eq!(config.replication.replication_cooldown_secs, 300);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
hive_name: prod-hive
max_concurrent_tasks: 20
replication:
  min_queue_depth: 4
  max_drones_per_type: 3
  replication_cooldown_secs: 60
logging:
  level: debug
  format: pretty
";
        let config: HiveConfig = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.hive_name, "prod-hive");
        assert_eq!(config.max_concurrent_tasks, 20);
        assert_eq!(config.replication.min_queue_depth, 4);
        assert_eq!(config.replication.max_drones_per_type, 3);
        assert_eq!(config.replication.replication_cooldown_secs, 60);
        // Unspecified fields fall back to defaults
        assert_eq!(config.replication.initial_workers, 1);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "pretty");
    }
}
