use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("backend not found: `{path}`")]
    BackendNotFound { path: PathBuf },
    #[error("failed to load backend `{path}`: {details}")]
    BackendLoad { path: PathBuf, details: String },
    #[error("failed to invoke backend `{path}`: {details}")]
    Invocation { path: PathBuf, details: String },
    #[error("invalid config at `{path}`: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("io failed at `{path}`: {source}")]
    IoAt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::BackendNotFound { path: path.into() }
    }

    pub fn load(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        Self::BackendLoad {
            path: path.into(),
            details: details.into(),
        }
    }

    pub fn invocation(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        Self::Invocation {
            path: path.into(),
            details: details.into(),
        }
    }

    pub fn io_at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoAt {
            path: path.into(),
            source,
        }
    }

    /// True for failures that happen before any native call is made.
    pub fn is_load_error(&self) -> bool {
        matches!(self, Self::BackendNotFound { .. } | Self::BackendLoad { .. })
    }
}
