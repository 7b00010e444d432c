// src/errors.rs

//! Crate-wide error taxonomy and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StagerunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid run spec: {0}")]
    InvalidSpec(String),

    #[error("Staging directory {dir:?} is not clear: unexpected entries {entries:?}")]
    StagingNotClear { dir: PathBuf, entries: Vec<String> },

    #[error("Failed to launch `{command_line}`: {source}")]
    LaunchFailed {
        command_line: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Staging directory {dir:?} unavailable: {reason}")]
    DirectoryUnavailable { dir: PathBuf, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, StagerunError>;
