use std::path::PathBuf;
use thiserror::Error;

use crate::graph::resolver::ResolutionFailure;

#[derive(Debug, Error)]
pub enum ImportGrapherError {
    #[error("Invalid filter pattern {pattern:?}: {source}")]
    InvalidFilter { pattern: String, source: regex::Error },

    #[error("Module {0} not found in graph")]
    ModuleNotFound(String),

    #[error("Root module {identifier} could not be resolved: {failure}")]
    RootUnresolved { identifier: String, failure: ResolutionFailure },

    #[error("Visualization error: {0}")]
    Visualization(String),

    #[error("Config error in {file}: {message}")]
    Config { file: PathBuf, message: String },

    #[error("Manifest error in {file}: {message}")]
    Manifest { file: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ImportGrapherError {
    /// Process exit code used by the CLI for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } | Self::Manifest { .. } => 2,
            _ => 1,
        }
    }
}
