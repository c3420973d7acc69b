//! Cloud provider trait definition

use crate::error::Result;
use crate::resource::{ProvisionedResource, ResourceKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Capability axis a provider can be registered under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Storage,
    Decomposer,
    Embedder,
    Indexer,
    CloudInfrastructure,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Capability::Storage => "storage",
            Capability::Decomposer => "decomposer",
            Capability::Embedder => "embedder",
            Capability::Indexer => "indexer",
            Capability::CloudInfrastructure => "cloud_infrastructure",
        };
        f.write_str(name)
    }
}

/// Cloud provider abstraction trait
///
/// All cloud providers (Azure, and eventually AWS/GCP) implement this trait
/// to provide a uniform interface for connectivity checks, inventory,
/// resource creation and teardown.
///
/// Operational failures of `test_connection` and `destroy_resource_group`
/// are captured in the returned value, not raised; creation primitives
/// error out so the provisioning engine can abort the remaining steps.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Returns the provider identifier (e.g. "azure")
    fn name(&self) -> &str;

    /// Returns the provider display name for UI
    fn display_name(&self) -> &str;

    /// Check connectivity and authentication. Never errors.
    async fn test_connection(&self) -> ConnectionStatus;

    /// Full resource inventory: all managed resource groups with their
    /// top-level resources plus one level of nested resources. Never
    /// errors; failures are captured in the returned value, and a single
    /// nested-resource lookup failure degrades to a per-group warning.
    async fn get_resources(&self) -> Inventory;

    /// Initiate destruction of a resource group. The call returns once
    /// deletion is initiated, not completed; callers needing confirmation
    /// poll [`CloudProvider::get_resources`] until the group disappears.
    async fn destroy_resource_group(&self, resource_group: &str) -> DestroyOutcome;

    /// Create one resource. Used by the provisioning engine while walking
    /// the deployment plan.
    async fn create_resource(
        &self,
        kind: ResourceKind,
        request: &CreateRequest,
    ) -> Result<ProvisionedResource>;
}

/// Result of a connectivity test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,

    /// Truncated, never the full subscription identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConnectionStatus {
    pub fn ok(provider: impl Into<String>, account_name: impl Into<String>) -> Self {
        Self {
            success: true,
            provider: Some(provider.into()),
            account_name: Some(account_name.into()),
            subscription_id: None,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            provider: None,
            account_name: None,
            subscription_id: None,
            error: Some(error.into()),
        }
    }

    pub fn with_subscription(mut self, truncated_id: impl Into<String>) -> Self {
        self.subscription_id = Some(truncated_id.into());
        self
    }
}

/// Complete provider inventory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inventory {
    pub success: bool,

    #[serde(default)]
    pub resource_groups: Vec<ResourceGroupInfo>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Inventory {
    pub fn ok(resource_groups: Vec<ResourceGroupInfo>) -> Self {
        Self {
            success: true,
            resource_groups,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            resource_groups: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// Whether a group with the given name is present
    pub fn contains_group(&self, name: &str) -> bool {
        self.resource_groups.iter().any(|g| g.name == name)
    }
}

/// One resource group with its resources
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceGroupInfo {
    pub name: String,
    pub location: String,
    pub resource_count: usize,
    pub resources: Vec<ResourceInfo>,

    /// Non-fatal per-group problems (e.g. a nested-resource listing that
    /// failed and degraded to an empty list)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// One resource inside a resource group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceInfo {
    pub name: String,

    #[serde(rename = "type")]
    pub resource_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Result of a destroy call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestroyOutcome {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DestroyOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}

/// Input to one creation step
#[derive(Debug, Clone)]
pub struct CreateRequest {
    /// Name the resource should be created under
    pub name: String,

    /// Resource group the resource belongs to
    pub resource_group: String,

    /// Target region
    pub location: String,

    /// Name of the resource this step depends on (e.g. the storage account
    /// a container is created in)
    pub depends_on: Option<String>,
}
