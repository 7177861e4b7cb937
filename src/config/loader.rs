//! Configuration Loader
//!
//! Environment-aware loading: defaults, then `multiqueue.toml`, then
//! `multiqueue.{environment}.toml`, then `MULTIQUEUE__*` environment variables.
//! Missing files are skipped.

use super::MultiQueueConfig;
use crate::constants::env as env_vars;
use crate::error::Result;
use config::{Config, Environment, File, FileFormat};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

pub struct ConfigManager {
    config: MultiQueueConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> Result<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> Result<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> Result<Arc<ConfigManager>> {
        Self::load_with_env_source(config_dir, environment, None)
    }

    /// Same as [`Self::load_from_directory_with_env`] but reads overrides from
    /// `env_source` instead of the process environment
    pub fn load_with_env_source(
        config_dir: Option<PathBuf>,
        environment: &str,
        env_source: Option<config::Map<String, String>>,
    ) -> Result<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);

        debug!(
            "Loading configuration for environment '{}' from directory: {}",
            environment,
            config_directory.display()
        );

        let config = Self::build(&config_directory, environment, env_source)?;
        config.validate()?;

        info!(
            environment = %environment,
            default_timeout_seconds = config.default_timeout_seconds,
            modes = ?config.modes,
            "Configuration loaded"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    fn build(
        config_directory: &Path,
        environment: &str,
        env_source: Option<config::Map<String, String>>,
    ) -> Result<MultiQueueConfig> {
        let base = config_directory.join("multiqueue.toml");
        let overlay = config_directory.join(format!("multiqueue.{environment}.toml"));

        let settings = Config::builder()
            .add_source(File::from(base).format(FileFormat::Toml).required(false))
            .add_source(File::from(overlay).format(FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix(env_vars::CONFIG_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("modes")
                    .try_parsing(true)
                    .source(env_source),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn config(&self) -> &MultiQueueConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    /// `MULTIQUEUE_ENV`, then `APP_ENV`, then `development`
    pub fn detect_environment() -> String {
        env::var(env_vars::ENVIRONMENT)
            .or_else(|_| env::var(env_vars::FALLBACK_ENVIRONMENT))
            .unwrap_or_else(|_| "development".to_string())
    }

    fn default_config_directory() -> PathBuf {
        env::var(env_vars::CONFIG_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"))
    }
}
