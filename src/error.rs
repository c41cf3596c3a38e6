//! Error types shared by the library and both binaries.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Unreadable or malformed configuration. Callers log it and fall back to defaults.
    #[error("config {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Size cache could not be written or published.
    #[error("size cache {path}: {message}")]
    Cache { path: PathBuf, message: String },

    #[error("terminal: {0}")]
    Terminal(#[source] io::Error),
}

impl Error {
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn cache(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Error::Cache {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
