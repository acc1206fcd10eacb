use crate::core::models::params::TableError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] super::config::ConfigError),

    #[error(transparent)]
    ParameterTable(#[from] TableError),

    #[error("No ligands (*.{extension}) found in {}", dir.display())]
    NoLigands { dir: PathBuf, extension: String },

    #[error("No jobs prepared. Check receptors/ligands/parameter table inputs.")]
    NoJobs,

    #[error("No parse targets found: {0}")]
    NoTargets(String),

    #[error("File I/O error for '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV output error for '{}': {source}", path.display())]
    Csv { path: PathBuf, source: csv::Error },

    #[error("Failed to build worker pool: {0}")]
    WorkerPool(String),

    #[error("Internal logic error: {0}")]
    Internal(String),
}

impl EngineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}
