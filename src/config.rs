use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::Session;

pub const DEFAULT_API_URL: &str = "http://localhost:5678";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Http,
    Local,
    Memory,
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Backend::Http),
            "local" => Ok(Backend::Local),
            "memory" => Ok(Backend::Memory),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: Backend,
    pub api_url: String,
    pub api_token: Option<String>,
    pub database_path: Option<PathBuf>,
    pub session_path: Option<PathBuf>,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            backend: Backend::Http,
            api_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            database_path: None,
            session_path: None,
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Applies `BILLED_API_URL` and `BILLED_BACKEND` over the file values.
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(url) = std::env::var("BILLED_API_URL") {
            if !url.trim().is_empty() {
                self.api_url = url;
            }
        }
        if let Ok(backend) = std::env::var("BILLED_BACKEND") {
            self.backend = backend.parse()?;
        }
        Ok(self)
    }

    pub fn database_path(&self, config_dir: &Path) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| config_dir.join("billed.sqlite"))
    }

    pub fn session_path(&self, config_dir: &Path) -> PathBuf {
        self.session_path
            .clone()
            .unwrap_or_else(|| config_dir.join("session.json"))
    }
}

pub fn config_dir() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("billed"))
        .ok_or(ConfigError::NoConfigDir)
}

/// Loads `config.toml` from `config_dir`; a missing file yields the defaults.
pub fn load_config(config_dir: &Path) -> Result<Config, ConfigError> {
    let path = config_dir.join("config.toml");
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
}

pub fn load_session(path: &Path) -> Result<Session, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::SessionMissing(path.to_path_buf()));
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Session::from_json(&content).map_err(|source| ConfigError::SessionMalformed {
        path: path.to_path_buf(),
        source,
    })
}
