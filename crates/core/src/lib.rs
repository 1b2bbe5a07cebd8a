//! # layerguard-core
//!
//! Shared foundation for the layerguard workspace: environment-driven
//! configuration and `tracing` based structured logging.

pub mod config;
pub mod logging;

pub use config::{
    AppConfigTrait, ConfigError, ConfigSource, ConstraintsConfig, Environment, LayerguardConfig,
    LogFormat,
};
pub use logging::{init_logging, LoggingConfig};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get crate version
pub fn version() -> &'static str {
    VERSION
}
