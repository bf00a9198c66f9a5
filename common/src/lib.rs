//! Shared utilities for postgres-provision crates
//!
//! This crate provides common functionality used by the provisioning library:
//! - Structured logging initialization
//! - Environment variable parsing helpers
//! - Command execution utilities

pub mod command;
pub mod config;
pub mod logging;

pub use command::{run, CommandOutput};
pub use config::ConfigExt;
pub use logging::init_logging;
