//! Azure provider error types

use docstack_cloud::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AzureError {
    #[error("Azure CLI not authenticated. Run: az login")]
    NotAuthenticated,

    #[error("az command failed: {0}")]
    CommandFailed(String),

    #[error("Resource group not found: {0}")]
    GroupNotFound(String),

    #[error("Missing dependency for {0}: no parent resource name supplied")]
    MissingDependency(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cloud error: {0}")]
    Cloud(#[from] CloudError),
}

impl From<AzureError> for CloudError {
    fn from(err: AzureError) -> Self {
        match err {
            AzureError::NotAuthenticated => CloudError::Authentication(err.to_string()),
            AzureError::GroupNotFound(name) => CloudError::ResourceNotFound(name),
            AzureError::Cloud(inner) => inner,
            other => CloudError::Deployment(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AzureError>;
