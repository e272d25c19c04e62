//! Runtime configuration loaded from TOML with environment overrides
use super::store::SledStore;
use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const ENV_DB_PATH: &str = "TRANSPORT_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "TRANSPORT_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "TRANSPORT_LOG_FORMAT";

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    pub path: PathBuf,
    /// Throw the database away on drop. Handy for demos and tests.
    pub temporary: bool,
    pub cache_capacity: u64,
    pub flush_every_ms: Option<u64>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/transport-requests.db"),
            temporary: false,
            cache_capacity: 64 * 1024 * 1024,
            flush_every_ms: Some(500),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Compact,
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => anyhow::bail!("unsupported log format `{other}` (expected compact|pretty|json)"),
        }
    }
}

impl AppConfig {
    /// Read `path`, then apply environment overrides from the process environment.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        tracing::debug!("loading configuration from {:?}", path);

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {path:?}"))?;
        let mut config = Self::from_toml(&contents)
            .with_context(|| format!("failed to parse config file {path:?}"))?;
        config.apply_env(|key| std::env::var(key).ok())?;

        Ok(config)
    }

    /// Defaults plus environment overrides, for when there is no config file.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(path) = lookup(ENV_DB_PATH) {
            self.storage.path = PathBuf::from(path);
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = level;
        }
        if let Some(format) = lookup(ENV_LOG_FORMAT) {
            self.logging.format = format
                .parse()
                .with_context(|| format!("invalid {ENV_LOG_FORMAT}"))?;
        }
        Ok(())
    }
}

impl StorageConfig {
    pub fn open(&self) -> anyhow::Result<SledStore> {
        let db = sled::Config::new()
            .path(&self.path)
            .temporary(self.temporary)
            .cache_capacity(self.cache_capacity)
            .flush_every_ms(self.flush_every_ms)
            .open()
            .with_context(|| format!("failed to open request store at {:?}", self.path))?;

        tracing::info!(path = ?self.path, temporary = self.temporary, "request store opened");
        Ok(SledStore::new(Arc::new(db))?)
    }
}
