//! Azure provider implementation

use crate::azcli::{AzCli, CONTAINER_TYPE, STORAGE_ACCOUNT_TYPE};
use crate::error::{AzureError, Result};
use async_trait::async_trait;
use docstack_cloud::{
    CloudProvider, CommandRunner, ConnectionStatus, CreateRequest, DestroyOutcome, Inventory,
    ProvisionedResource, ResourceGroupInfo, ResourceInfo, ResourceKind,
};
use std::sync::Arc;
use std::time::Duration;

/// Grace period after a location-mismatch delete before recreating the
/// group under the same name. The delete is asynchronous on Azure's side;
/// this is a pragmatic guard, not a wait-for-completion.
const RECREATE_PAUSE: Duration = Duration::from_secs(3);

/// Form Recognizer accounts reject key listing until provisioning settles
const READINESS_PAUSE: Duration = Duration::from_secs(10);

/// Azure-specific configuration handed in at wiring time
#[derive(Debug, Clone, Default)]
pub struct AzureSettings {
    /// Case-insensitive substring filter on resource group names for
    /// inventory queries. `None` returns every group.
    pub resource_group_prefix: Option<String>,
}

/// Azure cloud infrastructure provider
pub struct AzureProvider {
    cli: AzCli,
    settings: AzureSettings,
}

impl AzureProvider {
    pub fn new(settings: AzureSettings, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            cli: AzCli::new(runner),
            settings,
        }
    }

    /// Complete inventory of a single resource group, including containers
    /// nested in its storage accounts. Returns `None` when the top-level
    /// resource listing fails; that group is skipped.
    async fn group_details(&self, name: &str) -> Option<ResourceGroupInfo> {
        let raw_resources = match self.cli.resource_list(name).await {
            Ok(resources) => resources,
            Err(e) => {
                tracing::warn!("Skipping resource group {}: {}", name, e);
                return None;
            }
        };

        let location = match self.cli.group_show(name).await {
            Ok(group) => group.location,
            Err(_) => "unknown".to_string(),
        };

        let mut resources: Vec<ResourceInfo> = raw_resources
            .iter()
            .map(|r| ResourceInfo {
                name: r.name.clone(),
                resource_type: r.resource_type.clone(),
                location: r.location.clone(),
            })
            .collect();

        let mut warnings = Vec::new();

        // One nesting level: containers inside each storage account. A
        // failed listing degrades to an empty list for that account.
        for account in raw_resources
            .iter()
            .filter(|r| r.resource_type == STORAGE_ACCOUNT_TYPE)
        {
            match self.cli.storage_container_list(&account.name).await {
                Ok(containers) => {
                    for container in containers {
                        resources.push(ResourceInfo {
                            name: format!("{container} (container)"),
                            resource_type: CONTAINER_TYPE.to_string(),
                            location: account.location.clone(),
                        });
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to list containers for storage account {}: {}",
                        account.name,
                        e
                    );
                    warnings.push(format!(
                        "container listing failed for storage account {}: {e}",
                        account.name
                    ));
                }
            }
        }

        Some(ResourceGroupInfo {
            name: name.to_string(),
            location,
            resource_count: resources.len(),
            resources,
            warnings,
        })
    }

    async fn create_resource_group(&self, request: &CreateRequest) -> Result<ProvisionedResource> {
        // Reuse an existing group when the location matches; a mismatch
        // forces delete-and-recreate under the same name.
        if let Ok(existing) = self.cli.group_show(&request.name).await {
            if existing.location == request.location {
                tracing::info!(
                    "Using existing resource group {} in {}",
                    request.name,
                    existing.location
                );
                let mut resource =
                    ProvisionedResource::new(ResourceKind::ResourceGroup, &request.name)
                        .with_location(existing.location)
                        .with_existing(true);
                if let Some(id) = existing.id {
                    resource = resource.with_id(id);
                }
                return Ok(resource);
            }

            tracing::info!(
                "Resource group {} exists in {}, deleting to recreate in {}",
                request.name,
                existing.location,
                request.location
            );
            self.cli.group_delete_no_wait(&request.name).await?;
            // Known race: the new create may contend with the still-deleting
            // old group of the same name.
            tokio::time::sleep(RECREATE_PAUSE).await;
        }

        let created = self.cli.group_create(&request.name, &request.location).await?;

        let mut resource = ProvisionedResource::new(ResourceKind::ResourceGroup, &request.name)
            .with_location(request.location.clone());
        if let Some(id) = created.id {
            resource = resource.with_id(id);
        }
        Ok(resource)
    }

    async fn create_storage_account(&self, request: &CreateRequest) -> Result<ProvisionedResource> {
        let created = self
            .cli
            .storage_account_create(&request.name, &request.resource_group, &request.location)
            .await?;

        let mut resource = ProvisionedResource::new(ResourceKind::StorageAccount, &request.name)
            .with_location(request.location.clone());
        if let Some(endpoint) = created["primaryEndpoints"]["blob"].as_str() {
            resource = resource.with_endpoint(endpoint);
        }
        Ok(resource)
    }

    async fn create_storage_container(
        &self,
        request: &CreateRequest,
    ) -> Result<ProvisionedResource> {
        let account = request
            .depends_on
            .as_deref()
            .ok_or_else(|| AzureError::MissingDependency("storage container".to_string()))?;

        let keys = self
            .cli
            .storage_keys_list(account, &request.resource_group)
            .await?;
        let account_key = keys
            .first()
            .ok_or_else(|| AzureError::CommandFailed("no storage account keys returned".to_string()))?;

        self.cli
            .storage_container_create(&request.name, account, &account_key.value)
            .await?;

        Ok(
            ProvisionedResource::new(ResourceKind::StorageContainer, &request.name)
                .with_attribute("storage_account", serde_json::json!(account)),
        )
    }

    async fn create_form_recognizer(&self, request: &CreateRequest) -> Result<ProvisionedResource> {
        let created = self
            .cli
            .cognitive_account_create(&request.name, &request.resource_group, &request.location)
            .await?;

        // Key listing 429s/404s until the account settles
        tracing::info!("Waiting for Form Recognizer {} to be ready", request.name);
        tokio::time::sleep(READINESS_PAUSE).await;

        let keys = self
            .cli
            .cognitive_keys_list(&request.name, &request.resource_group)
            .await?;

        let mut resource = ProvisionedResource::new(ResourceKind::FormRecognizer, &request.name)
            .with_location(request.location.clone())
            .with_attribute("key", serde_json::json!(keys.key1));
        if let Some(endpoint) = created["properties"]["endpoint"].as_str() {
            resource = resource.with_endpoint(endpoint);
        }
        Ok(resource)
    }

    async fn create_search_service(&self, request: &CreateRequest) -> Result<ProvisionedResource> {
        self.cli
            .search_service_create(&request.name, &request.resource_group, &request.location)
            .await?;

        Ok(
            ProvisionedResource::new(ResourceKind::SearchService, &request.name)
                .with_location(request.location.clone())
                .with_endpoint(format!("https://{}.search.windows.net", request.name)),
        )
    }
}

#[async_trait]
impl CloudProvider for AzureProvider {
    fn name(&self) -> &str {
        "azure"
    }

    fn display_name(&self) -> &str {
        "Microsoft Azure"
    }

    async fn test_connection(&self) -> ConnectionStatus {
        match self.cli.account_show().await {
            Ok(account) => {
                let truncated = account.truncated_id();
                ConnectionStatus::ok("azure", account.name).with_subscription(truncated)
            }
            Err(AzureError::NotAuthenticated) => {
                ConnectionStatus::failed("Azure CLI not authenticated. Run: az login")
            }
            Err(e) => ConnectionStatus::failed(format!("Azure test failed: {e}")),
        }
    }

    async fn get_resources(&self) -> Inventory {
        let groups = match self.cli.group_list().await {
            Ok(groups) => groups,
            Err(e) => {
                tracing::warn!("Failed to list resource groups: {}", e);
                return Inventory::failed("Failed to list resource groups");
            }
        };

        let filtered: Vec<String> = match &self.settings.resource_group_prefix {
            Some(prefix) if !prefix.is_empty() => {
                let needle = prefix.to_lowercase();
                groups
                    .into_iter()
                    .filter(|g| g.to_lowercase().contains(&needle))
                    .collect()
            }
            _ => groups,
        };

        let mut resource_groups = Vec::new();
        for name in &filtered {
            if let Some(details) = self.group_details(name).await {
                resource_groups.push(details);
            }
        }

        Inventory::ok(resource_groups)
    }

    async fn destroy_resource_group(&self, resource_group: &str) -> DestroyOutcome {
        let exists = match self.cli.group_exists(resource_group).await {
            Ok(exists) => exists,
            Err(e) => {
                tracing::warn!("Existence check failed for {}: {}", resource_group, e);
                return DestroyOutcome::failed("Failed to check resource group");
            }
        };

        if !exists {
            return DestroyOutcome::failed("Resource group not found");
        }

        match self.cli.group_delete_no_wait(resource_group).await {
            Ok(()) => DestroyOutcome::ok(format!(
                "Resource group '{resource_group}' deletion initiated. \
                 This may take several minutes to complete."
            )),
            Err(e) => DestroyOutcome::failed(format!("Failed to delete resource group: {e}")),
        }
    }

    async fn create_resource(
        &self,
        kind: ResourceKind,
        request: &CreateRequest,
    ) -> docstack_cloud::Result<ProvisionedResource> {
        let resource = match kind {
            ResourceKind::ResourceGroup => self.create_resource_group(request).await?,
            ResourceKind::StorageAccount => self.create_storage_account(request).await?,
            ResourceKind::StorageContainer => self.create_storage_container(request).await?,
            ResourceKind::FormRecognizer => self.create_form_recognizer(request).await?,
            ResourceKind::SearchService => self.create_search_service(request).await?,
        };
        Ok(resource)
    }
}
