//! Cloud provider error types

use thiserror::Error;

/// Cloud provider errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("{0}")]
    Validation(String),

    #[error("Deployment command failed: {0}")]
    Deployment(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CloudError>;
