//! Shared helpers for the CLI and pipeline

pub mod logging;

pub use logging::{init_from_env, init_logging, LoggingConfig};
