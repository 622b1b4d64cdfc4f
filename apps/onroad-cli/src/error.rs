use onroad_core::ValidationError;
use onroad_engine::EngineError;
use thiserror::Error;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("No storage location available; pass --storage")]
    NoStoragePath,

    #[error("Failed to read {path}: {reason}")]
    Input { path: String, reason: String },

    #[error("Invalid batch input: {0}")]
    BatchFormat(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation(_) | CliError::BatchFormat(_) => 2,
            CliError::Engine(e) if e.is_config_error() => 3,
            _ => 1,
        }
    }
}
