//! Provider registry and factory
//!
//! Maps provider identifiers to adapter implementations per capability
//! axis, and resolves the preferred provider for an axis when none is
//! requested. Adapters register at wiring time; lookups for a missing
//! identifier fail with [`CloudError::ProviderNotFound`].

use crate::error::{CloudError, Result};
use crate::provider::{Capability, CloudProvider};
use std::collections::HashMap;
use std::sync::Arc;

/// Known identifiers per non-cloud axis. These adapters live outside this
/// crate; the registry only answers availability and matching queries for
/// them.
const STORAGE_PROVIDERS: &[&str] = &["azure", "azure_blob"];
const DECOMPOSER_PROVIDERS: &[&str] = &["local"];
const EMBEDDER_PROVIDERS: &[&str] = &["openai", "openai_embedding"];
const INDEXER_PROVIDERS: &[&str] = &["local", "azure_search", "azure_ai_search"];

/// Preferred provider per capability axis, resolved from configuration
/// once at startup
#[derive(Debug, Clone)]
pub struct PreferredProviders {
    pub storage: String,
    pub decomposer: String,
    pub embedder: String,
    pub indexer: String,
    pub cloud: String,
}

impl Default for PreferredProviders {
    fn default() -> Self {
        Self {
            storage: "azure".to_string(),
            decomposer: "local".to_string(),
            embedder: "openai".to_string(),
            indexer: "local".to_string(),
            cloud: "azure".to_string(),
        }
    }
}

impl PreferredProviders {
    fn for_axis(&self, capability: Capability) -> &str {
        match capability {
            Capability::Storage => &self.storage,
            Capability::Decomposer => &self.decomposer,
            Capability::Embedder => &self.embedder,
            Capability::Indexer => &self.indexer,
            Capability::CloudInfrastructure => &self.cloud,
        }
    }
}

/// Requirements for capability matching (`find_provider`).
///
/// Currently only carried through; matching always resolves to the
/// preferred provider for the axis. Richer matching (MIME type support,
/// vector dimensions) hangs off this struct later.
#[derive(Debug, Clone, Default)]
pub struct Requirements {
    pub mime_type: Option<String>,
    pub dimensions: Option<usize>,
}

/// Provider registry with registered cloud adapters
pub struct ProviderRegistry {
    preferred: PreferredProviders,
    cloud: HashMap<String, Arc<dyn CloudProvider>>,
}

impl ProviderRegistry {
    pub fn new(preferred: PreferredProviders) -> Self {
        Self {
            preferred,
            cloud: HashMap::new(),
        }
    }

    /// Register a cloud adapter under its own name
    pub fn register_cloud(&mut self, provider: Arc<dyn CloudProvider>) {
        self.cloud.insert(provider.name().to_string(), provider);
    }

    /// Look up a cloud adapter. `None` resolves the preferred provider for
    /// the cloud-infrastructure axis.
    pub fn cloud(&self, provider: Option<&str>) -> Result<Arc<dyn CloudProvider>> {
        let name = provider.unwrap_or(&self.preferred.cloud).to_lowercase();
        self.cloud
            .get(&name)
            .cloned()
            .ok_or_else(|| CloudError::ProviderNotFound(format!("Cloud provider not found: {name}")))
    }

    /// Preferred provider for a capability axis
    pub fn preferred(&self, capability: Capability) -> &str {
        self.preferred.for_axis(capability)
    }

    /// Identifiers registered under a capability axis
    pub fn available_providers(&self, capability: Capability) -> Vec<String> {
        match capability {
            Capability::Storage => to_vec(STORAGE_PROVIDERS),
            Capability::Decomposer => to_vec(DECOMPOSER_PROVIDERS),
            Capability::Embedder => to_vec(EMBEDDER_PROVIDERS),
            Capability::Indexer => to_vec(INDEXER_PROVIDERS),
            Capability::CloudInfrastructure => {
                let mut names: Vec<String> = self.cloud.keys().cloned().collect();
                names.sort();
                names
            }
        }
    }

    /// Whether an identifier is registered under an axis
    pub fn is_available(&self, provider: &str, capability: Capability) -> bool {
        let name = provider.to_lowercase();
        self.available_providers(capability)
            .iter()
            .any(|p| p == &name)
    }

    /// Find the best provider for a set of requirements.
    ///
    /// Reference policy: every provider on an axis satisfies every
    /// requirement, so this returns the preferred provider.
    pub fn find_provider(&self, capability: Capability, _requirements: &Requirements) -> &str {
        self.preferred(capability)
    }
}

fn to_vec(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{
        ConnectionStatus, CreateRequest, DestroyOutcome, Inventory,
    };
    use crate::resource::{ProvisionedResource, ResourceKind};
    use async_trait::async_trait;

    struct StubProvider;

    #[async_trait]
    impl CloudProvider for StubProvider {
        fn name(&self) -> &str {
            "azure"
        }

        fn display_name(&self) -> &str {
            "Stub Azure"
        }

        async fn test_connection(&self) -> ConnectionStatus {
            ConnectionStatus::ok("azure", "stub")
        }

        async fn get_resources(&self) -> Inventory {
            Inventory::ok(Vec::new())
        }

        async fn destroy_resource_group(&self, _resource_group: &str) -> DestroyOutcome {
            DestroyOutcome::ok("initiated")
        }

        async fn create_resource(
            &self,
            kind: ResourceKind,
            request: &CreateRequest,
        ) -> crate::error::Result<ProvisionedResource> {
            Ok(ProvisionedResource::new(kind, request.name.clone()))
        }
    }

    fn registry() -> ProviderRegistry {
        let mut registry = ProviderRegistry::new(PreferredProviders::default());
        registry.register_cloud(Arc::new(StubProvider));
        registry
    }

    #[test]
    fn test_cloud_lookup_defaults_to_preferred() {
        let registry = registry();
        assert_eq!(registry.cloud(None).unwrap().name(), "azure");
        assert_eq!(registry.cloud(Some("AZURE")).unwrap().name(), "azure");
    }

    #[test]
    fn test_cloud_lookup_unknown_provider() {
        let registry = registry();
        let err = match registry.cloud(Some("digitalocean")) {
            Ok(_) => panic!("expected provider lookup to fail"),
            Err(err) => err,
        };
        assert!(matches!(err, CloudError::ProviderNotFound(_)));
    }

    #[test]
    fn test_availability_lookups() {
        let registry = registry();
        assert!(registry.is_available("azure", Capability::CloudInfrastructure));
        assert!(registry.is_available("azure_blob", Capability::Storage));
        assert!(!registry.is_available("aws", Capability::CloudInfrastructure));
        assert_eq!(
            registry.available_providers(Capability::Decomposer),
            vec!["local".to_string()]
        );
    }

    #[test]
    fn test_find_provider_returns_preferred() {
        let registry = registry();
        let requirements = Requirements {
            mime_type: Some("application/pdf".to_string()),
            dimensions: None,
        };
        assert_eq!(
            registry.find_provider(Capability::Embedder, &requirements),
            "openai"
        );
    }
}
