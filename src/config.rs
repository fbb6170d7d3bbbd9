//! Configuration management for transpile
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags (--preset, --plugin, etc.)
//! 2. Environment variables (TRANSPILE_SANDBOX__MAX_STEPS, etc.)
//! 3. Config file (transpile.toml in the working directory or ~/.config/transpile/config.toml)
//! 4. Built-in defaults
//!
//! # Example Config File (transpile.toml)
//!
//! ```toml
//! [transform]
//! presets = ["es2015", "stage-1", "react"]
//! plugins = ["transform-react-inline-elements"]
//!
//! [sandbox]
//! max_steps = 1000000
//! max_call_depth = 128
//! result = "exports"
//!
//! [log]
//! filter = "info"
//! ```
//!
//! # Environment Variables
//!
//! Sections and keys are joined with `__` after the `TRANSPILE_` prefix:
//! - TRANSPILE_TRANSFORM__PRESETS=es2015,react
//! - TRANSPILE_SANDBOX__MAX_STEPS=5000
//! - TRANSPILE_LOG__FILTER=debug
//!
//! TRANSPILE_CONFIG_PATH points at a config file outside the default search.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::executor::{Limits, ResultMode, SandboxEvaluator};
use crate::transform::TransformConfig;

const ENV_PREFIX: &str = "TRANSPILE";
const CONFIG_PATH_VAR: &str = "TRANSPILE_CONFIG_PATH";

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub transform: TransformConfig,

    #[serde(default)]
    pub sandbox: SandboxConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// Limits and result selection for the sandboxed evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxConfig {
    #[serde(default = "default_max_steps")]
    pub max_steps: u64,

    #[serde(default = "default_max_call_depth")]
    pub max_call_depth: usize,

    #[serde(default)]
    pub result: ResultMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing_subscriber` filter directive; `RUST_LOG` wins when set
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

// Default value functions for serde
fn default_max_steps() -> u64 {
    Limits::default().max_steps
}
fn default_max_call_depth() -> usize {
    Limits::default().max_call_depth
}
fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            max_call_depth: default_max_call_depth(),
            result: ResultMode::default(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl SandboxConfig {
    pub fn limits(&self) -> Limits {
        Limits {
            max_steps: self.max_steps,
            max_call_depth: self.max_call_depth,
            ..Limits::default()
        }
    }

    pub fn evaluator(&self) -> SandboxEvaluator {
        SandboxEvaluator::new(self.limits(), self.result)
    }
}

impl Config {
    /// Load configuration with full priority chain:
    /// CLI flags → env vars → config file → defaults
    pub fn load() -> Result<Self> {
        Self::builder().build()
    }

    /// Render as TOML, the same shape the loader reads
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Create a builder for constructing config with overrides
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for constructing Config with optional overrides
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config_path: Option<PathBuf>,
    presets: Option<Vec<String>>,
    plugins: Option<Vec<String>>,
    max_steps: Option<u64>,
    result: Option<ResultMode>,
    log_filter: Option<String>,
}

impl ConfigBuilder {
    /// Override the config file path
    pub fn config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Replace the preset list; an empty list leaves it alone
    pub fn presets(mut self, presets: Vec<String>) -> Self {
        if !presets.is_empty() {
            self.presets = Some(presets);
        }
        self
    }

    /// Replace the plugin list; an empty list leaves it alone
    pub fn plugins(mut self, plugins: Vec<String>) -> Self {
        if !plugins.is_empty() {
            self.plugins = Some(plugins);
        }
        self
    }

    pub fn max_steps(mut self, max_steps: Option<u64>) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn result(mut self, result: Option<ResultMode>) -> Self {
        self.result = result;
        self
    }

    pub fn log_filter(mut self, filter: Option<String>) -> Self {
        self.log_filter = filter;
        self
    }

    /// Build the final config by applying priority chain
    pub fn build(self) -> Result<Config> {
        // .env first, so real env vars override it
        let _ = dotenvy::dotenv();

        let mut builder = config::Config::builder().add_source(
            config::Config::try_from(&Config::default())
                .context("Failed to seed default configuration")?,
        );

        if let Some(path) = self.locate_config_file()? {
            builder = builder.add_source(
                config::File::from(path.as_path())
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("transform.presets")
                .with_list_parse_key("transform.plugins"),
        );

        let mut config: Config = builder
            .build()
            .context("Failed to load configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        self.apply_overrides(&mut config);

        if config.sandbox.max_steps == 0 {
            anyhow::bail!("sandbox.max_steps must be greater than zero");
        }
        if config.sandbox.max_call_depth == 0 {
            anyhow::bail!("sandbox.max_call_depth must be greater than zero");
        }

        Ok(config)
    }

    /// Explicit path, then TRANSPILE_CONFIG_PATH, then the default search
    fn locate_config_file(&self) -> Result<Option<PathBuf>> {
        if let Some(path) = &self.config_path {
            if !path.exists() {
                anyhow::bail!("Config file not found: {:?}", path);
            }
            return Ok(Some(path.clone()));
        }

        if let Ok(path_str) = env::var(CONFIG_PATH_VAR) {
            let path = PathBuf::from(path_str);
            if !path.exists() {
                anyhow::bail!("Config file not found: {:?}", path);
            }
            return Ok(Some(path));
        }

        Ok(find_config_file())
    }

    /// Apply CLI overrides (highest priority)
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(presets) = &self.presets {
            config.transform.presets = presets.clone();
        }

        if let Some(plugins) = &self.plugins {
            config.transform.plugins = plugins.clone();
        }

        if let Some(max_steps) = self.max_steps {
            config.sandbox.max_steps = max_steps;
        }

        if let Some(result) = self.result {
            config.sandbox.result = result;
        }

        if let Some(filter) = &self.log_filter {
            config.log.filter = filter.clone();
        }
    }
}

/// Search for config file in default locations
fn find_config_file() -> Option<PathBuf> {
    // 1. Working directory: ./transpile.toml
    let project_config = PathBuf::from("transpile.toml");
    if project_config.exists() {
        return Some(project_config);
    }

    // 2. User config: ~/.config/transpile/config.toml
    if let Some(home) = env::var_os("HOME") {
        let user_config = PathBuf::from(home)
            .join(".config")
            .join("transpile")
            .join("config.toml");
        if user_config.exists() {
            return Some(user_config);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp_config(name: &str, contents: &str) -> PathBuf {
        let path = env::temp_dir().join(format!("transpile-{}-{}.toml", name, std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.transform.presets, vec!["es2015", "stage-1", "react"]);
        assert!(config.transform.plugins.is_empty());
        assert_eq!(config.sandbox.max_steps, 1_000_000);
        assert_eq!(config.sandbox.result, ResultMode::Exports);
        assert_eq!(config.log.filter, "info");
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            [transform]
            presets = ["es2015"]

            [sandbox]
            max_steps = 5000
            result = "completion"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.transform.presets, vec!["es2015"]);
        assert!(config.transform.plugins.is_empty());
        assert_eq!(config.sandbox.max_steps, 5000);
        assert_eq!(config.sandbox.max_call_depth, 128); // Default
        assert_eq!(config.sandbox.result, ResultMode::Completion);
        assert_eq!(config.log, LogConfig::default());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = Config::default();
        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("[sandbox]"));
        assert_eq!(toml::from_str::<Config>(&rendered).unwrap(), config);
    }

    #[test]
    fn test_builder_with_overrides() {
        let config = Config::builder()
            .presets(vec!["react".to_string()])
            .plugins(vec!["transform-react-inline-elements".to_string()])
            .max_steps(Some(250))
            .result(Some(ResultMode::Completion))
            .build()
            .unwrap();

        assert_eq!(config.transform.presets, vec!["react"]);
        assert_eq!(config.transform.plugins, vec!["transform-react-inline-elements"]);
        assert_eq!(config.sandbox.max_steps, 250);
        assert_eq!(config.sandbox.result, ResultMode::Completion);
    }

    #[test]
    fn test_empty_preset_override_keeps_configured_list() {
        let config = Config::builder().presets(vec![]).build().unwrap();
        assert!(!config.transform.presets.is_empty());
    }

    #[test]
    fn test_explicit_config_file() {
        let path = write_temp_config(
            "explicit",
            "[transform]\nplugins = [\"transform-react-inline-elements\"]\n\n[log]\nfilter = \"debug\"\n",
        );

        let config = Config::builder()
            .config_path(Some(path.clone()))
            .build()
            .unwrap();
        assert_eq!(config.transform.plugins, vec!["transform-react-inline-elements"]);
        assert_eq!(config.log.filter, "debug");

        // CLI still wins over the file
        let config = Config::builder()
            .config_path(Some(path.clone()))
            .log_filter(Some("warn".to_string()))
            .build()
            .unwrap();
        assert_eq!(config.log.filter, "warn");

        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_missing_config_file_error() {
        let result = Config::builder()
            .config_path(Some(PathBuf::from("/nonexistent/transpile.toml")))
            .build();
        let error_msg = result.unwrap_err().to_string();
        assert!(error_msg.contains("Config file not found"));
    }

    #[test]
    fn test_env_var_overlay() {
        std::env::set_var("TRANSPILE_SANDBOX__MAX_CALL_DEPTH", "7");
        let result = Config::builder().build();
        std::env::remove_var("TRANSPILE_SANDBOX__MAX_CALL_DEPTH");

        assert_eq!(result.unwrap().sandbox.max_call_depth, 7);
    }

    #[test]
    fn test_zero_step_limit_is_rejected() {
        let result = Config::builder().max_steps(Some(0)).build();
        assert!(result.unwrap_err().to_string().contains("max_steps"));
    }

    #[test]
    fn test_sandbox_evaluator_from_config() {
        let sandbox = SandboxConfig {
            max_steps: 10,
            max_call_depth: 2,
            result: ResultMode::Completion,
        };
        assert_eq!(
            sandbox.evaluator(),
            SandboxEvaluator::new(
                Limits {
                    max_steps: 10,
                    max_call_depth: 2,
                    ..Limits::default()
                },
                ResultMode::Completion,
            )
        );
    }
}
