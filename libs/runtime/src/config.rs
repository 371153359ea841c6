use anyhow::{Context, Result};
use query_db::{DatabaseConfig, QueryConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Application configuration: where the store lives, how queries page, and
/// how much gets logged.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Console level for every target without an explicit entry.
    #[serde(default = "default_level")]
    pub level: String,
    /// Per-target console levels, e.g. `query_db: debug`.
    #[serde(default)]
    pub targets: HashMap<String, String>,
    /// Emit console records as JSON lines.
    #[serde(default)]
    pub json: bool,
    /// Optional rotating JSON log file.
    #[serde(default)]
    pub file: Option<FileSink>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileSink {
    /// Relative paths resolve against the directory passed to `init_logging`.
    pub path: String,
    #[serde(default = "default_file_level")]
    pub level: String,
    #[serde(default)]
    pub max_size_mb: Option<u64>,
    #[serde(default)]
    pub max_backups: Option<usize>,
}

fn default_level() -> String {
    "info".to_owned()
}

fn default_file_level() -> String {
    "debug".to_owned()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            targets: HashMap::new(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load configuration with layered loading: defaults → YAML file → environment variables.
    pub fn load_layered<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        use figment::{
            providers::{Env, Format, Serialized, Yaml},
            Figment,
        };

        let figment = Figment::new()
            .merge(Serialized::defaults(AppConfig::default()))
            .merge(Yaml::file(config_path.as_ref()))
            // Example: APP__QUERY__MAX_PAGE_SIZE=200 maps to query.max_page_size
            .merge(Env::prefixed("APP__").split("__"));

        figment
            .extract()
            .with_context(|| "Failed to extract config from figment".to_string())
    }

    /// Load configuration from file or fall back to defaults.
    pub fn load_or_default<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_layered(path),
            None => Ok(Self::default()),
        }
    }

    /// Serialize configuration to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config to YAML")
    }
}
