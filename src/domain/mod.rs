//! Domain layer for the Hive orchestration system
//!
//! Pure business logic: domain models, state machines, and the port traits
//! that external collaborators implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
