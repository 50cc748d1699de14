use std::{io, path};

use docmodel_json_store::CacheError;

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error("No model file given: pass --model or set {}", crate::MODEL_ENV)]
    NoModel,

    #[error("Cannot read model file {path}: {error}")]
    ReadModel {
        path: path::PathBuf,
        error: io::Error,
    },

    #[error("Invalid filter '{filter}': expected NAME=VALUE")]
    InvalidFilter { filter: String },

    #[error("Model error: {0}")]
    Model(#[from] docmodel_core::Error),

    #[error("{0}")]
    Serde(#[from] docmodel_serde::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
