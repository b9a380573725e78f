//! Logging initialization using tracing.

use std::io;

use anyhow::{anyhow, Result};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::domain::models::LoggingConfig;

/// Initialized logging backend. Holds the appender guard so buffered file
/// output is flushed on drop.
pub struct Logging {
    _guard: Option<WorkerGuard>,
}

impl Logging {
    /// Initialize the global subscriber from configuration.
    ///
    /// Stdout output follows the configured format; when `log_dir` is set,
    /// a daily-rotated JSON file layer is added as well.
    ///
    /// # Errors
    /// Returns an error if the level is unparseable or a subscriber is
    /// already installed.
    pub fn init(config: &LoggingConfig) -> Result<Self> {
        let default_level = parse_log_level(&config.level)?;
        let env_filter = EnvFilter::builder()
            .with_default_directive(default_level.into())
            .from_env_lossy();

        let guard = if let Some(ref log_dir) = config.log_dir {
            let file_appender = rolling::daily(log_dir, "hive.log");
            let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

            // File output is always JSON for structured ingestion
            let file_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking_file)
                .with_ansi(false)
                .with_target(true)
                .with_filter(env_filter);

            let stdout_filter = EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy();
            let stdout_layer = stdout_layer(config, stdout_filter);

            tracing_subscriber::registry()
                .with(file_layer)
                .with(stdout_layer)
                .try_init()
                .map_err(|e| anyhow!("Failed to initialize logging: {e}"))?;

            Some(guard)
        } else {
            let stdout_layer = stdout_layer(config, env_filter);
            tracing_subscriber::registry()
                .with(stdout_layer)
                .try_init()
                .map_err(|e| anyhow!("Failed to initialize logging: {e}"))?;

            None
        };

        Ok(Self { _guard: guard })
    }
}

fn stdout_layer<S>(
    config: &LoggingConfig,
    filter: EnvFilter,
) -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    if config.format == "json" {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(io::stdout)
            .with_target(true)
            .with_filter(filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .pretty()
            .with_writer(io::stdout)
            .with_target(true)
            .with_filter(filter)
            .boxed()
    }
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(anyhow!("Invalid log level: {other}")),
    }
}
