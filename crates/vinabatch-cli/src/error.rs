use std::path::PathBuf;
use thiserror::Error;
use vinabatch::engine::error::EngineError;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Process exit status: 2 when there was nothing to do, 1 for every other failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Engine(EngineError::NoJobs | EngineError::NoTargets(_)) => 2,
            _ => 1,
        }
    }
}
