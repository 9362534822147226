// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum A11yError {
    #[error("I/O error: {source} (path: {path})")]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("JSON error: {source} (path: {path})")]
    Json {
        source: serde_json::Error,
        path: PathBuf,
    },

    #[error("Invalid config {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("Invalid site identity: {0:?}")]
    InvalidSite(String),
}

pub type Result<T> = std::result::Result<T, A11yError>;

impl A11yError {
    pub(crate) fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            source,
            path: path.into(),
        }
    }

    pub(crate) fn json(source: serde_json::Error, path: impl Into<PathBuf>) -> Self {
        Self::Json {
            source,
            path: path.into(),
        }
    }
}

// Allow `?` on std::io::Error by converting to A11yError::Io with unknown path.
impl From<std::io::Error> for A11yError {
    fn from(source: std::io::Error) -> Self {
        A11yError::Io {
            source,
            path: PathBuf::from("<unknown>"),
        }
    }
}
