mod commands;

use clap::{Parser, Subcommand};
use commands::{check, resolve};
use layerguard_core::{
    init_logging, AppConfigTrait, ConfigError, LayerguardConfig, LoggingConfig,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "layerguard")]
#[command(about = "Inspect per-user constraint filters on published GIS layers")]
#[command(version)]
struct Cli {
    /// Override the configured log level
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the restriction a user ends up with on a layer
    Resolve {
        /// Rule fixture (YAML or JSON); defaults to LAYERGUARD_RULES_FILE
        #[arg(long)]
        rules: Option<PathBuf>,

        /// User id
        #[arg(long)]
        user: Option<String>,

        /// Group membership, repeatable
        #[arg(long = "group")]
        groups: Vec<String>,

        /// Layer id
        #[arg(long)]
        layer: String,

        /// Subset string already on the layer
        #[arg(long)]
        subset: Option<String>,

        /// Filter expression already on the request
        #[arg(long)]
        expression: Option<String>,

        /// Bounding box `minx,miny,maxx,maxy`
        #[arg(long)]
        bbox: Option<String>,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a rule fixture and summarize it per layer
    Check {
        /// Rule fixture (YAML or JSON); defaults to LAYERGUARD_RULES_FILE
        #[arg(long)]
        rules: Option<PathBuf>,
    },
}

impl Commands {
    fn rules_override(&self) -> Option<&Path> {
        match self {
            Commands::Resolve { rules, .. } | Commands::Check { rules } => rules.as_deref(),
        }
    }
}

/// Environment configuration with the command line overrides applied, validated once
fn build_config(cli: &Cli) -> Result<LayerguardConfig, ConfigError> {
    let mut config = LayerguardConfig::load_env()?;
    if let Some(level) = cli.log_level.as_deref() {
        config = config.with_log_level(level);
    }
    if let Some(path) = cli.command.rules_override() {
        config = config.with_rules_file(path);
    }
    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = build_config(&cli)?;
    init_logging(LoggingConfig::from_config(&config))?;
    for (key, source) in config.config_sources() {
        tracing::debug!(key = %key, source = %source, "Configuration value");
    }

    let output = match cli.command {
        Commands::Resolve {
            user,
            groups,
            layer,
            subset,
            expression,
            bbox,
            json,
            ..
        } => resolve::run(
            &config,
            &resolve::ResolveArgs {
                user,
                groups,
                layer,
                subset,
                expression,
                bbox,
                json,
            },
        )?,
        Commands::Check { .. } => check::run(&config)?,
    };

    println!("{}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clean_test_env() {
        for var in ["LAYERGUARD_ENV", "LAYERGUARD_LOG_LEVEL", "LAYERGUARD_RULES_FILE"] {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_rules_flag_satisfies_production() {
        clean_test_env();
        env::set_var("LAYERGUARD_ENV", "production");

        let cli = Cli::try_parse_from(["layerguard", "check", "--rules", "rules.yaml"]).unwrap();
        let config = build_config(&cli).unwrap();
        assert!(config.environment.is_production());
        assert_eq!(
            config.constraints.rules_file.as_deref(),
            Some(Path::new("rules.yaml"))
        );

        let cli = Cli::try_parse_from(["layerguard", "check"]).unwrap();
        assert!(matches!(
            build_config(&cli),
            Err(ConfigError::MissingRequired { .. })
        ));

        clean_test_env();
    }

    #[test]
    #[serial]
    fn test_log_level_flag_is_case_insensitive() {
        clean_test_env();

        let cli = Cli::try_parse_from([
            "layerguard",
            "--log-level",
            "DEBUG",
            "resolve",
            "--layer",
            "parcels",
        ])
        .unwrap();
        let config = build_config(&cli).unwrap();
        assert_eq!(config.log_level, "debug");

        let cli = Cli::try_parse_from(["layerguard", "--log-level", "loud", "check"]).unwrap();
        assert!(build_config(&cli).is_err());
    }
}
