//! Engine error types

use docstack_cloud::CloudError;
use docstack_core::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{0}")]
    Validation(String),

    #[error("Deployment failed: {0}")]
    Deployment(String),

    #[error("Database backup failed: {0}")]
    Backup(String),

    #[error("Destroy failed: {0}")]
    Destroy(String),

    #[error(transparent)]
    Cloud(#[from] CloudError),

    #[error(transparent)]
    Store(#[from] CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Machine-readable error code surfaced alongside the human message
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "VALIDATION_ERROR",
            EngineError::Deployment(_) => "DEPLOYMENT_FAILED",
            EngineError::Backup(_) => "BACKUP_FAILED",
            EngineError::Destroy(_) => "DESTROY_FAILED",
            EngineError::Cloud(CloudError::ProviderNotFound(_)) => "INVALID_PROVIDER",
            EngineError::Cloud(_) => "CLOUD_ERROR",
            EngineError::Store(_) => "STORE_ERROR",
            EngineError::Io(_) => "IO_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
