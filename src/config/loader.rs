//! Configuration Loader
//!
//! Environment-aware configuration loading. Handles file discovery,
//! environment detection and layering through the `config` crate.

use super::error::{ConfigResult, ConfigurationError};
use super::TrackerConfig;
use ::config::{Config, Environment, File, Map};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const ENV_PREFIX: &str = "TRACKER";
const ENV_SEPARATOR: &str = "__";

/// Loaded configuration together with where it came from
#[derive(Debug)]
pub struct ConfigManager {
    config: TrackerConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        Self::load_with_overrides(config_dir, environment, None)
    }

    /// Load configuration with an explicit map standing in for the process
    /// environment. Keys use the `TRACKER__SECTION__FIELD` form.
    pub fn load_with_overrides(
        config_dir: Option<PathBuf>,
        environment: &str,
        env_overrides: Option<Map<String, String>>,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let explicit_dir = config_dir.is_some();
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);

        if explicit_dir && !config_directory.is_dir() {
            return Err(ConfigurationError::DirectoryNotFound {
                path: config_directory,
            });
        }

        debug!(
            environment = %environment,
            config_directory = %config_directory.display(),
            "Loading tracker configuration"
        );

        let config = Self::build_config(&config_directory, environment, env_overrides)?;
        config.validate()?;

        info!(
            environment = %environment,
            node_id = %config.node_id,
            deployment_mode = %config.deployment_mode,
            poll_interval_seconds = config.polling.interval_seconds,
            "⚙️ Tracker configuration loaded"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    fn build_config(
        config_directory: &Path,
        environment: &str,
        env_overrides: Option<Map<String, String>>,
    ) -> ConfigResult<TrackerConfig> {
        let load_err = |e: ::config::ConfigError| ConfigurationError::load_error(environment, e);

        let defaults = Config::try_from(&TrackerConfig::default()).map_err(load_err)?;
        let base_file = config_directory.join("tracker.toml");
        let env_file = config_directory.join(format!("tracker.{environment}.toml"));

        let mut env_source = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true);
        if env_overrides.is_some() {
            env_source = env_source.source(env_overrides);
        }

        Config::builder()
            .add_source(defaults)
            .add_source(File::from(base_file).required(false))
            .add_source(File::from(env_file).required(false))
            .add_source(env_source)
            .build()
            .and_then(|built| built.try_deserialize::<TrackerConfig>())
            .map_err(load_err)
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Environment name the configuration was loaded for
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Directory the configuration files were read from
    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    /// Detect the current environment from environment variables
    pub fn detect_environment() -> String {
        env::var("TRACKER_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
    }

    /// `TRACKER_CONFIG_DIR`, falling back to `./config`
    pub fn default_config_directory() -> PathBuf {
        env::var("TRACKER_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_system::DeploymentMode;
    use std::fs;

    fn write(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn test_empty_directory_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::load_with_overrides(
            Some(dir.path().to_path_buf()),
            "test",
            Some(Map::new()),
        )
        .unwrap();
        assert_eq!(manager.config(), &TrackerConfig::default());
        assert_eq!(manager.environment(), "test");
    }

    #[test]
    fn test_environment_file_overrides_base_file() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "tracker.toml",
            r#"
node_id = "pipeline-runner"

[polling]
interval_seconds = 120
"#,
        );
        write(
            dir.path(),
            "tracker.production.toml",
            r#"
deployment_mode = "PollingOnly"

[polling]
interval_seconds = 600
"#,
        );

        let manager = ConfigManager::load_with_overrides(
            Some(dir.path().to_path_buf()),
            "production",
            Some(Map::new()),
        )
        .unwrap();
        let config = manager.config();
        assert_eq!(config.node_id, "pipeline-runner");
        assert_eq!(config.polling.interval_seconds, 600);
        assert_eq!(config.deployment_mode, DeploymentMode::PollingOnly);
        assert_eq!(config.provisioning.initial_recheck_seconds, 5);
    }

    #[test]
    fn test_env_overrides_win_over_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "tracker.toml", "[polling]\ninterval_seconds = 120\n");

        let mut overrides = Map::new();
        overrides.insert(
            "TRACKER__POLLING__INTERVAL_SECONDS".to_string(),
            "30".to_string(),
        );
        let manager = ConfigManager::load_with_overrides(
            Some(dir.path().to_path_buf()),
            "test",
            Some(overrides),
        )
        .unwrap();
        assert_eq!(manager.config().polling.interval_seconds, 30);
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "tracker.toml",
            "[provisioning]\nretry_interval_seconds = 0\n",
        );
        let err = ConfigManager::load_with_overrides(
            Some(dir.path().to_path_buf()),
            "test",
            Some(Map::new()),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidValue { .. }));
    }

    #[test]
    fn test_missing_explicit_directory() {
        let err = ConfigManager::load_with_overrides(
            Some(PathBuf::from("/definitely/not/here")),
            "test",
            Some(Map::new()),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::DirectoryNotFound { .. }));
    }
}
