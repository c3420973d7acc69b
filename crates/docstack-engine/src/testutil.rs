//! Shared test doubles for engine tests

use async_trait::async_trait;
use docstack_cloud::{
    CloudProvider, ConnectionStatus, CreateRequest, DestroyOutcome, Inventory,
    PreferredProviders, ProviderRegistry, ProvisionedResource, ResourceKind,
};
use docstack_config::{AppConfig, AzureConfig, DatabaseConfig, Environment, ProviderPreferences};
use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// In-memory cloud provider double. Remembers which resource groups it has
/// created so a second deployment sees them as existing, records every
/// create/destroy call, and can be scripted to fail a given step or serve
/// canned inventories.
pub struct FakeCloudProvider {
    requests: Mutex<Vec<(ResourceKind, CreateRequest)>>,
    groups: Mutex<HashSet<String>>,
    destroy_calls: Mutex<Vec<String>>,
    inventories: Mutex<VecDeque<Inventory>>,
    fail_on: Option<ResourceKind>,
    destroy_fails: bool,
}

impl FakeCloudProvider {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            groups: Mutex::new(HashSet::new()),
            destroy_calls: Mutex::new(Vec::new()),
            inventories: Mutex::new(VecDeque::new()),
            fail_on: None,
            destroy_fails: false,
        }
    }

    pub fn fail_on(mut self, kind: ResourceKind) -> Self {
        self.fail_on = Some(kind);
        self
    }

    pub fn failing_destroy(mut self) -> Self {
        self.destroy_fails = true;
        self
    }

    /// Queue inventories returned by successive `get_resources` calls;
    /// once drained, an empty successful inventory is returned
    pub fn push_inventory(&self, inventory: Inventory) {
        self.inventories.lock().unwrap().push_back(inventory);
    }

    pub fn request_for(&self, kind: ResourceKind) -> Option<CreateRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, request)| request.clone())
    }

    pub fn create_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn destroy_count(&self) -> usize {
        self.destroy_calls.lock().unwrap().len()
    }
}

impl Default for FakeCloudProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CloudProvider for FakeCloudProvider {
    fn name(&self) -> &str {
        "azure"
    }

    fn display_name(&self) -> &str {
        "Fake Azure"
    }

    async fn test_connection(&self) -> ConnectionStatus {
        ConnectionStatus::ok("azure", "fake-account")
    }

    async fn get_resources(&self) -> Inventory {
        self.inventories
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Inventory::ok(Vec::new()))
    }

    async fn destroy_resource_group(&self, resource_group: &str) -> DestroyOutcome {
        self.destroy_calls
            .lock()
            .unwrap()
            .push(resource_group.to_string());

        if self.destroy_fails {
            DestroyOutcome::failed("Resource group not found")
        } else {
            self.groups.lock().unwrap().remove(resource_group);
            DestroyOutcome::ok(format!(
                "Resource group '{resource_group}' deletion initiated. \
                 This may take several minutes to complete."
            ))
        }
    }

    async fn create_resource(
        &self,
        kind: ResourceKind,
        request: &CreateRequest,
    ) -> docstack_cloud::Result<ProvisionedResource> {
        self.requests.lock().unwrap().push((kind, request.clone()));

        if self.fail_on == Some(kind) {
            return Err(docstack_cloud::CloudError::Deployment(format!(
                "simulated failure creating {kind}"
            )));
        }

        let resource = match kind {
            ResourceKind::ResourceGroup => {
                let existing = !self.groups.lock().unwrap().insert(request.name.clone());
                ProvisionedResource::new(kind, &request.name)
                    .with_location(request.location.clone())
                    .with_existing(existing)
            }
            _ => ProvisionedResource::new(kind, &request.name)
                .with_location(request.location.clone()),
        };
        Ok(resource)
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        preferred: ProviderPreferences::default(),
        azure: AzureConfig {
            subscription_id: Some("12345678-abcd-ef01-2345-67890abcdef0".to_string()),
            tenant_id: Some("87654321-abcd-ef01-2345-67890abcdef0".to_string()),
            resource_group_prefix: None,
            storage_container: "documents".to_string(),
        },
        database: DatabaseConfig::default(),
        org_tag: "uts".to_string(),
        environment: Environment::Development,
        backup_dir: PathBuf::from("tmp/backups"),
    }
}

pub fn test_registry(provider: Arc<FakeCloudProvider>) -> Arc<ProviderRegistry> {
    let mut registry = ProviderRegistry::new(PreferredProviders::default());
    registry.register_cloud(provider);
    Arc::new(registry)
}
