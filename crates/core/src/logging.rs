//! # Structured Logging
//!
//! `tracing-subscriber` setup shared by the layerguard binaries. Library crates
//! only emit `tracing` events; whoever owns `main` calls [`init_logging`].

use crate::config::{ConfigError, Environment, LayerguardConfig, LogFormat};
use std::io;
use tracing_subscriber::{fmt::Layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "warn")
    pub level: String,
    /// Output format
    pub format: LogFormat,
    /// Include file and line number information
    pub include_location: bool,
    /// Environment filter (supports complex filters like "layerguard_constraints=debug")
    pub env_filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            include_location: false,
            env_filter: None,
        }
    }
}

impl LoggingConfig {
    /// Create production logging configuration
    pub fn production() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
            include_location: false,
            env_filter: Some("layerguard=info,layerguard_constraints=info".to_string()),
        }
    }

    /// Create development logging configuration
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            format: LogFormat::Pretty,
            include_location: true,
            env_filter: Some("layerguard=debug,layerguard_constraints=debug".to_string()),
        }
    }

    /// Create test logging configuration (minimal output)
    pub fn test() -> Self {
        Self {
            level: "error".to_string(),
            format: LogFormat::Plain,
            include_location: false,
            env_filter: None,
        }
    }

    /// Derive logging settings from the application configuration
    pub fn from_config(config: &LayerguardConfig) -> Self {
        let base = match config.environment {
            Environment::Production => Self::production(),
            Environment::Testing => Self::test(),
            Environment::Development => Self::development(),
        };

        Self {
            level: config.log_level.clone(),
            format: config.log_format,
            env_filter: None,
            ..base
        }
    }

    /// Set environment filter
    pub fn with_env_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// The filter directive used when `RUST_LOG` is not set
    pub fn filter_directive(&self) -> &str {
        self.env_filter.as_deref().unwrap_or(&self.level)
    }
}

/// Initialize structured logging for the process. Logs go to stderr so that
/// command output on stdout stays machine readable.
pub fn init_logging(config: LoggingConfig) -> Result<(), ConfigError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.filter_directive()))
        .map_err(|e| ConfigError::LoggingInit {
            message: e.to_string(),
        })?;

    let registry = tracing_subscriber::registry().with(filter);
    let layer = Layer::new()
        .with_writer(io::stderr)
        .with_file(config.include_location)
        .with_line_number(config.include_location);

    let result = match config.format {
        LogFormat::Json => registry.with(layer.json()).try_init(),
        LogFormat::Pretty => registry.with(layer.pretty()).try_init(),
        LogFormat::Plain => registry.with(layer).try_init(),
    };
    result.map_err(|e| ConfigError::LoggingInit {
        message: e.to_string(),
    })?;

    tracing::debug!(
        target: "layerguard::logging",
        level = %config.level,
        format = ?config.format,
        "Structured logging initialized"
    );

    Ok(())
}
