use std::{io, path};

use docmodel_core::Error as ModelError;

#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    #[error("An error occurred trying to read the root path {path}: {error}")]
    RootPathInvalid {
        path: path::PathBuf,
        error: io::Error,
    },

    #[error("I/O error at {path}: {error}")]
    Io {
        path: path::PathBuf,
        error: io::Error,
    },

    #[error("Name '{name}' cannot be used as a cache entry")]
    InvalidName { name: String },

    #[error("{0}")]
    Model(#[from] ModelError),

    #[error("{0}")]
    Serde(#[from] docmodel_serde::Error),

    #[error("{0}")]
    SerializationError(#[from] serde_json::Error),
}

impl CacheError {
    pub(crate) fn io(path: &path::Path, error: io::Error) -> Self {
        CacheError::Io {
            path: path.to_path_buf(),
            error,
        }
    }
}
