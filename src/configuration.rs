use crate::client::{
    ClientBuilder, DEFAULT_RETRY_COUNT, DEFAULT_RETRY_INTERVAL, DEFAULT_URL_BASE,
};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::debug;

pub const DEFAULT_APPLICATION_ID: &str = "vagrant-cloud";
pub const DEFAULT_CONFIGURATION_FILE_NAME: &str = "config.yml";
pub const CONFIG_DIR_ENV: &str = "VAGRANT_CLOUD_CONFIG_DIR";

type Cause = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("failed to resolve the configuration directory")]
    FailedToFindConfigurationDirectory,
    #[error("failed to load configuration data, because of: {cause}")]
    FailedToLoadData { cause: Cause },
    #[error("failed to write configuration data to file, because of: {cause}")]
    FailedToWriteData { cause: Cause },
    #[error("invalid value for property {name:?}: {value}")]
    InvalidPropertyValue { name: String, value: String },
}

impl ConfigurationError {
    fn is_not_found(&self) -> bool {
        match self {
            ConfigurationError::FailedToLoadData { cause } => cause
                .downcast_ref::<std::io::Error>()
                .map(|e| e.kind() == std::io::ErrorKind::NotFound)
                .unwrap_or(false),
            _ => false,
        }
    }
}

fn default_url_base() -> String {
    DEFAULT_URL_BASE.to_string()
}

fn default_retry_count() -> u32 {
    DEFAULT_RETRY_COUNT
}

fn default_retry_interval() -> u64 {
    DEFAULT_RETRY_INTERVAL.as_secs()
}

/// Client settings persisted between runs. Credentials are never stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default = "default_url_base")]
    url_base: String,
    /// Total attempts for idempotent requests
    #[serde(default = "default_retry_count")]
    retry_count: u32,
    /// Seconds between attempts
    #[serde(default = "default_retry_interval")]
    retry_interval: u64,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            url_base: default_url_base(),
            retry_count: default_retry_count(),
            retry_interval: default_retry_interval(),
        }
    }
}

impl Configuration {
    pub fn url_base(&self) -> &str {
        &self.url_base
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval)
    }

    pub fn set_url_base(&mut self, url_base: &str) -> Result<(), ConfigurationError> {
        url::Url::parse(url_base).map_err(|_| ConfigurationError::InvalidPropertyValue {
            name: "url_base".to_string(),
            value: url_base.to_string(),
        })?;
        self.url_base = url_base.to_string();
        Ok(())
    }

    pub fn set_retry_count(&mut self, retry_count: u32) {
        self.retry_count = retry_count;
    }

    pub fn set_retry_interval(&mut self, retry_interval: Duration) {
        self.retry_interval = retry_interval.as_secs();
    }

    /// Builder seeded with this configuration.
    pub fn client_builder(&self) -> ClientBuilder {
        ClientBuilder::new()
            .url_base(self.url_base.clone())
            .retry_count(self.retry_count)
            .retry_interval(self.retry_interval())
    }

    pub fn get_default_configuration_file_path() -> Result<PathBuf, ConfigurationError> {
        if let Ok(config_dir_str) = std::env::var(CONFIG_DIR_ENV) {
            let mut config_path = PathBuf::from(config_dir_str);
            config_path.push(DEFAULT_CONFIGURATION_FILE_NAME);
            return Ok(config_path);
        }

        match config_dir() {
            Some(configuration_directory) => {
                let mut default_config_file_path = configuration_directory;
                default_config_file_path.push(DEFAULT_APPLICATION_ID);
                default_config_file_path.push(DEFAULT_CONFIGURATION_FILE_NAME);
                Ok(default_config_file_path)
            }
            None => Err(ConfigurationError::FailedToFindConfigurationDirectory),
        }
    }

    pub fn load_default() -> Result<Configuration, ConfigurationError> {
        let default_file_path = Configuration::get_default_configuration_file_path()?;
        debug!("Loading configuration from {}...", default_file_path.display());
        Configuration::load_from_file(&default_file_path)
    }

    /// Load the default configuration, writing a default one if none exists
    pub fn load_or_create_default() -> Result<Configuration, ConfigurationError> {
        let default_file_path = Configuration::get_default_configuration_file_path()?;
        debug!(
            "Loading or creating configuration from {}...",
            default_file_path.display()
        );

        match Configuration::load_from_file(&default_file_path) {
            Ok(config) => Ok(config),
            Err(e) if e.is_not_found() => {
                debug!("Configuration file not found, creating default configuration");
                let default_config = Configuration::default();
                default_config.save(&default_file_path)?;
                Ok(default_config)
            }
            Err(e) => Err(e),
        }
    }

    /// Load the default configuration, falling back to defaults in memory when
    /// no file exists
    pub fn load_or_default() -> Result<Configuration, ConfigurationError> {
        match Configuration::load_default() {
            Err(e) if e.is_not_found() => Ok(Configuration::default()),
            other => other,
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Configuration, ConfigurationError> {
        let configuration = fs::read_to_string(path)
            .map_err(|cause| ConfigurationError::FailedToLoadData {
                cause: Box::new(cause),
            })?;
        serde_yaml::from_str(&configuration).map_err(|cause| {
            ConfigurationError::FailedToLoadData {
                cause: Box::new(cause),
            }
        })
    }

    pub fn write<W: Write>(&self, writer: W) -> Result<(), ConfigurationError> {
        serde_yaml::to_writer(writer, self)
            .map_err(|e| ConfigurationError::FailedToWriteData { cause: Box::new(e) })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigurationError> {
        // the parent directory is created on first save
        match path.parent() {
            Some(directory) => fs::create_dir_all(directory)
                .map_err(|_| ConfigurationError::FailedToFindConfigurationDirectory)?,
            None => return Err(ConfigurationError::FailedToFindConfigurationDirectory),
        }

        let file = File::create(path)
            .map_err(|e| ConfigurationError::FailedToWriteData { cause: Box::new(e) })?;
        self.write(file)
    }

    pub fn save_to_default(&self) -> Result<(), ConfigurationError> {
        self.save(&Self::get_default_configuration_file_path()?)
    }
}
