use std::path::PathBuf;

use thiserror::Error;

/// A rejected store operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("Erreur {status}: {message}")]
    Http { status: u16, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("database error: {0}")]
    Database(String),
}

impl StoreError {
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        StoreError::Http {
            status,
            message: message.into(),
        }
    }

    /// HTTP-style status code of the failure, when one applies.
    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Http { status, .. } => Some(*status),
            StoreError::NotFound(_) => Some(404),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound(err.to_string()),
            other => StoreError::Database(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => StoreError::http(status.as_u16(), err.to_string()),
            None if err.is_decode() => StoreError::Decode(err.to_string()),
            None => StoreError::Transport(err.to_string()),
        }
    }
}

#[derive(Debug, Error)]
#[error("invalid date '{raw}'")]
pub struct DateFormatError {
    pub raw: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("No session found at {0}. Sign in first.")]
    SessionMissing(PathBuf),

    #[error("Malformed session in {path}: {source}")]
    SessionMalformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unknown backend '{0}'. Expected http, local or memory.")]
    UnknownBackend(String),

    #[error("Could not determine a config directory")]
    NoConfigDir,
}
