//! Configuration loading.

pub mod loader;

pub use loader::{ConfigError, ConfigLoader};
