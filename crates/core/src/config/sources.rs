/// Origin of a configuration value, reported by `AppConfigTrait::config_sources`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Read from the named `LAYERGUARD_*` variable
    EnvVar(String),
    /// Built-in default, shown as text
    Default(String),
    /// Set by the configuration file at this path
    File(String),
    /// Overridden in code, e.g. by a command line flag
    Programmatic,
}

impl ConfigSource {
    pub fn is_env_var(&self) -> bool {
        matches!(self, ConfigSource::EnvVar(_))
    }

    pub fn is_default(&self) -> bool {
        matches!(self, ConfigSource::Default(_))
    }

    pub fn is_file(&self) -> bool {
        matches!(self, ConfigSource::File(_))
    }

    /// `EnvVar(var)` when `var` is set, otherwise `Default(default)`
    pub fn env_or_default(var: &str, default: impl Into<String>) -> Self {
        if std::env::var(var).is_ok() {
            ConfigSource::EnvVar(var.to_string())
        } else {
            ConfigSource::Default(default.into())
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::EnvVar(var) => write!(f, "Environment variable: {}", var),
            ConfigSource::Default(value) => write!(f, "Default value: {}", value),
            ConfigSource::File(path) => write!(f, "Configuration file: {}", path),
            ConfigSource::Programmatic => f.write_str("Command line override"),
        }
    }
}
