use crate::config::{parse_bool, validate_log_level, ConfigError, ConfigSource};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Configuration trait for application configuration
pub trait AppConfigTrait: Sized {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self, ConfigError>;

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError>;

    /// Get configuration source information for debugging
    fn config_sources(&self) -> HashMap<String, ConfigSource>;
}

/// Environment enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Testing,
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "testing" | "test" => Ok(Environment::Testing),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::invalid_value(
                "environment",
                s,
                "development, testing, or production",
            )),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let env_str = match self {
            Environment::Development => "development",
            Environment::Testing => "testing",
            Environment::Production => "production",
        };
        write!(f, "{}", env_str)
    }
}

impl Environment {
    /// Check if environment is development
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    /// Check if environment is testing
    pub fn is_testing(&self) -> bool {
        matches!(self, Environment::Testing)
    }

    /// Check if environment is production
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Plain,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "plain" | "text" => Ok(LogFormat::Plain),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::invalid_value("log_format", s, "pretty, plain, or json")),
        }
    }
}

/// Which constraint filter backends run, and where rules are loaded from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintsConfig {
    /// Rule fixture file (YAML or JSON)
    #[serde(default)]
    pub rules_file: Option<PathBuf>,

    /// Apply subset string constraint rules
    #[serde(default = "default_true")]
    pub subset_string_rules: bool,

    /// Apply expression constraint rules
    #[serde(default = "default_true")]
    pub expression_rules: bool,

    /// Apply session token filters
    #[serde(default = "default_true")]
    pub session_tokens: bool,

    /// Apply the `in_bbox` filter
    #[serde(default = "default_true")]
    pub bbox_filter: bool,
}

impl Default for ConstraintsConfig {
    fn default() -> Self {
        Self {
            rules_file: None,
            subset_string_rules: true,
            expression_rules: true,
            session_tokens: true,
            bbox_filter: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Values whose origin is reported by `config_sources`: key, variable, default
const TRACKED_VALUES: [(&str, &str, &str); 4] = [
    ("environment", "LAYERGUARD_ENV", "development"),
    ("log_level", "LAYERGUARD_LOG_LEVEL", "info"),
    ("log_format", "LAYERGUARD_LOG_FORMAT", "pretty"),
    ("constraints.rules_file", "LAYERGUARD_RULES_FILE", "none"),
];

fn default_sources() -> HashMap<String, ConfigSource> {
    TRACKED_VALUES
        .iter()
        .map(|(key, _, default)| (key.to_string(), ConfigSource::Default(default.to_string())))
        .collect()
}

/// Top level layerguard configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerguardConfig {
    #[serde(default)]
    pub environment: Environment,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    #[serde(default)]
    pub constraints: ConstraintsConfig,

    /// Origin of each tracked value
    #[serde(skip)]
    sources: HashMap<String, ConfigSource>,
}

impl LayerguardConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self {
            environment: Environment::Development,
            log_level: default_log_level(),
            log_format: LogFormat::Pretty,
            constraints: ConstraintsConfig::default(),
            sources: default_sources(),
        }
    }

    /// Create configuration for testing
    pub fn testing() -> Self {
        Self {
            environment: Environment::Testing,
            log_level: "warn".to_string(),
            log_format: LogFormat::Plain,
            constraints: ConstraintsConfig::default(),
            sources: default_sources(),
        }
    }

    /// Load configuration from a YAML or JSON file, picking the format from the extension
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        // Generic value first, so the keys the file actually sets can be recorded
        let value: serde_json::Value = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?,
        };
        let mut config: Self = serde_json::from_value(value.clone())?;

        config.sources = default_sources();
        let origin = path.display().to_string();
        for (key, _, _) in TRACKED_VALUES {
            let pointer = format!("/{}", key.replace('.', "/"));
            if value.pointer(&pointer).is_some() {
                config
                    .sources
                    .insert(key.to_string(), ConfigSource::File(origin.clone()));
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Read the `LAYERGUARD_*` variables without validating, so overrides can
    /// be applied before a single `validate()`
    pub fn load_env() -> Result<Self, ConfigError> {
        let mut config = Self::new();

        if let Ok(env_str) = env::var("LAYERGUARD_ENV") {
            config.environment = env_str.parse()?;
        }

        if let Ok(level) = env::var("LAYERGUARD_LOG_LEVEL") {
            config.log_level = level.to_lowercase();
        }

        if let Ok(format) = env::var("LAYERGUARD_LOG_FORMAT") {
            config.log_format = format.parse()?;
        }

        if let Ok(path) = env::var("LAYERGUARD_RULES_FILE") {
            if !path.trim().is_empty() {
                config.constraints.rules_file = Some(PathBuf::from(path));
            }
        }

        let flags: [(&str, &str, &mut bool); 4] = [
            (
                "LAYERGUARD_SUBSET_STRING_RULES",
                "subset_string_rules",
                &mut config.constraints.subset_string_rules,
            ),
            (
                "LAYERGUARD_EXPRESSION_RULES",
                "expression_rules",
                &mut config.constraints.expression_rules,
            ),
            (
                "LAYERGUARD_SESSION_TOKENS",
                "session_tokens",
                &mut config.constraints.session_tokens,
            ),
            (
                "LAYERGUARD_BBOX_FILTER",
                "bbox_filter",
                &mut config.constraints.bbox_filter,
            ),
        ];
        for (var, field, slot) in flags {
            if let Ok(value) = env::var(var) {
                *slot = parse_bool(field, &value)?;
            }
        }

        for (key, var, default) in TRACKED_VALUES {
            config
                .sources
                .insert(key.to_string(), ConfigSource::env_or_default(var, default));
        }

        Ok(config)
    }

    /// Override with a rules file given programmatically (e.g. a CLI flag)
    pub fn with_rules_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.constraints.rules_file = Some(path.into());
        self.sources
            .insert("constraints.rules_file".to_string(), ConfigSource::Programmatic);
        self
    }

    /// Override the log level; level names are case-insensitive
    pub fn with_log_level(mut self, level: &str) -> Self {
        self.log_level = level.to_lowercase();
        self.sources
            .insert("log_level".to_string(), ConfigSource::Programmatic);
        self
    }
}

impl Default for LayerguardConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfigTrait for LayerguardConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let config = Self::load_env()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        validate_log_level(&self.log_level)?;

        if self.environment.is_production() && self.constraints.rules_file.is_none() {
            return Err(ConfigError::missing_required(
                "constraints.rules_file",
                "LAYERGUARD_RULES_FILE is required in production",
            ));
        }

        Ok(())
    }

    fn config_sources(&self) -> HashMap<String, ConfigSource> {
        self.sources.clone()
    }
}
