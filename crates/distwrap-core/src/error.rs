use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub type WrapperResult<T> = Result<T, WrapperError>;

#[derive(Debug, Error)]
pub enum WrapperError {
    #[error("invalid value '{value}' for '{key}'; expected {expected}")]
    Configuration {
        key: String,
        value: String,
        expected: String,
    },

    #[error("cannot resolve distribution coordinate: {0}")]
    RepositoryResolution(String),

    #[error("failed to download {url}: {message}")]
    Download { url: String, message: String },

    #[error("sha256 mismatch for {url} (expected {expected}, got {actual})")]
    Integrity {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("failed to install distribution into {}: {message}", path.display())]
    Installation { path: PathBuf, message: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl WrapperError {
    pub fn configuration(
        key: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::Configuration {
            key: key.into(),
            value: value.into(),
            expected: expected.into(),
        }
    }

    pub fn download(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Download {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub fn installation(path: &Path, message: impl ToString) -> Self {
        Self::Installation {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }

    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
