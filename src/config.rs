use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::acquire::RetryPolicy;
use crate::propagate::PropagationConfig;
use crate::risk::RiskConfig;
use crate::trend::TrendConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub propagation: PropagationConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub trend: TrendConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// CelesTrak group used when the whole catalog is requested.
    #[serde(default = "default_group")]
    pub group: String,
    #[serde(default = "default_timeout", deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Objects screened as conjunction candidates for every assessment.
    #[serde(default = "default_neighbors")]
    pub neighbors: Vec<u32>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            group: default_group(),
            timeout: default_timeout(),
            user_agent: default_user_agent(),
            neighbors: default_neighbors(),
        }
    }
}

fn default_base_url() -> String {
    "https://celestrak.org/NORAD/elements/gp.php".to_string()
}

fn default_group() -> String {
    "stations".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_user_agent() -> String {
    concat!("bellatrix/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_neighbors() -> Vec<u32> {
    vec![25544, 20580, 54231, 39634, 33591, 41866, 25148, 43013]
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_folder")]
    pub folder: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            folder: default_store_folder(),
        }
    }
}

fn default_store_folder() -> PathBuf {
    PathBuf::from("tle_cache")
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn from_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.risk.validate().map_err(ConfigError::Invalid)?;
        self.retry.validate().map_err(ConfigError::Invalid)?;
        self.propagation.validate().map_err(ConfigError::Invalid)?;
        self.trend.validate().map_err(ConfigError::Invalid)?;
        Ok(())
    }
}

/// Accepts human-readable durations such as `"1s"`, `"90m"` or `"5days"`.
pub(crate) fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}
