use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::error::AppError;

/// Environment prefix for every configuration override.
pub const ENV_PREFIX: &str = "DATAPILOT";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_env(ENV_PREFIX)
    }

    /// Load configuration from environment with custom prefix
    pub fn load_from_env(prefix: &str) -> Result<Self, ConfigError> {
        let builder = Self::with_defaults(Config::builder())?.add_source(
            Environment::with_prefix(prefix)
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Load configuration from file with environment overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = Self::with_defaults(Config::builder())?
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    fn with_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default("engine.llm_fallback_threshold", default_llm_fallback_threshold())?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.json", false)
    }

    /// Checks cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), AppError> {
        self.engine.validate()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Intent engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Confidence below which the LLM classifier must be consulted
    #[serde(default = "default_llm_fallback_threshold")]
    pub llm_fallback_threshold: f64,
    /// Optional JSON/YAML resource extending the built-in intent patterns
    #[serde(default)]
    pub pattern_file: Option<String>,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self {
            llm_fallback_threshold: default_llm_fallback_threshold(),
            pattern_file: None,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.llm_fallback_threshold = threshold;
        self
    }

    pub fn with_pattern_file(mut self, path: impl Into<String>) -> Self {
        self.pattern_file = Some(path.into());
        self
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let threshold = self.llm_fallback_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(AppError::configuration(format!(
                "engine.llm_fallback_threshold must be within [0, 1], got {}",
                threshold
            )));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_llm_fallback_threshold() -> f64 {
    0.7
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_engine_config_creation() {
        let config = EngineConfig::new()
            .with_threshold(0.6)
            .with_pattern_file("patterns.json");

        assert_eq!(config.llm_fallback_threshold, 0.6);
        assert_eq!(config.pattern_file.as_deref(), Some("patterns.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_engine_config_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.llm_fallback_threshold, 0.7);
        assert!(config.pattern_file.is_none());
    }

    #[test]
    fn test_engine_config_rejects_out_of_range_threshold() {
        assert!(EngineConfig::new().with_threshold(1.5).validate().is_err());
        assert!(EngineConfig::new().with_threshold(-0.1).validate().is_err());
        assert!(EngineConfig::new().with_threshold(f64::NAN).validate().is_err());
        assert!(EngineConfig::new().with_threshold(0.0).validate().is_ok());
        assert!(EngineConfig::new().with_threshold(1.0).validate().is_ok());
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[engine]\nllm_fallback_threshold = 0.55\npattern_file = \"extra.yaml\"\n\n[logging]\nlevel = \"debug\""
        )
        .unwrap();

        let config = AppConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.engine.llm_fallback_threshold, 0.55);
        assert_eq!(config.engine.pattern_file.as_deref(), Some("extra.yaml"));
        assert_eq!(config.logging.level, "debug");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_load_from_partial_file_uses_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[logging]\njson = true").unwrap();

        let config = AppConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.engine.llm_fallback_threshold, 0.7);
        assert!(config.engine.pattern_file.is_none());
        assert!(config.logging.json);
        assert!(config.validate().is_ok());
    }
}
