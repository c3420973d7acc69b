//! Resource provisioning engine
//!
//! Walks a dependency-ordered plan against a cloud provider adapter,
//! passing each step's produced identity into the steps that depend on
//! it. Validation failures are reported before any external call; a step
//! failure aborts the remaining steps without rolling back resources that
//! were already created.

use crate::error::{EngineError, Result};
use crate::naming;
use crate::plan::{ResourceStep, default_plan, topo_sort};
use async_trait::async_trait;
use docstack_cloud::{CreateRequest, ProviderRegistry, ProvisionedResource, ResourceKind};
use docstack_config::AppConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

pub const SUPPORTED_PROVIDERS: &[&str] = &["azure", "aws", "gcp"];

/// Works for constrained subscriptions (e.g. Azure for Students)
pub const DEFAULT_LOCATION: &str = "eastasia";

/// Per-deployment overrides; anything unset falls back to generated names
/// and configured defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeployOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_group: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_account: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_recognizer_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_service: Option<String>,
}

/// Result of a successful deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployOutcome {
    pub provider: String,
    /// Manifest, in dependency order
    pub resources: Vec<ProvisionedResource>,
    pub message: String,
}

/// Lifecycle events emitted while a deployment runs
#[derive(Debug, Clone)]
pub enum DeployEvent {
    Started { provider: String },
    StepStarted { kind: ResourceKind },
    StepCompleted { resource: ProvisionedResource },
    Completed { resources: Vec<ProvisionedResource> },
    Failed { error: String },
}

/// Observer for deployment progress; the job runner maps events onto
/// progress records, the CLI prints them
#[async_trait]
pub trait DeployObserver: Send + Sync {
    async fn on_event(&self, event: &DeployEvent);
}

/// Observer that discards all events
pub struct NullObserver;

#[async_trait]
impl DeployObserver for NullObserver {
    async fn on_event(&self, _event: &DeployEvent) {}
}

/// Resource provisioning engine
pub struct DeployEngine {
    registry: Arc<ProviderRegistry>,
    config: Arc<AppConfig>,
}

impl DeployEngine {
    pub fn new(registry: Arc<ProviderRegistry>, config: Arc<AppConfig>) -> Self {
        Self { registry, config }
    }

    /// Provision the full plan against the given provider.
    pub async fn run(
        &self,
        provider: &str,
        options: &DeployOptions,
        observer: &dyn DeployObserver,
    ) -> Result<DeployOutcome> {
        tracing::info!("Starting deployment for provider: {}", provider);
        self.validate_provider(provider)?;
        self.validate_credentials(provider)?;

        let adapter = self.registry.cloud(Some(provider))?;
        let plan = topo_sort(default_plan())?;

        observer
            .on_event(&DeployEvent::Started {
                provider: provider.to_string(),
            })
            .await;

        let mut resources: Vec<ProvisionedResource> = Vec::new();
        let mut created: HashMap<ResourceKind, String> = HashMap::new();

        for step in plan.iter().filter(|s| s.required) {
            let request = self.step_request(step, options, &created)?;

            observer
                .on_event(&DeployEvent::StepStarted { kind: step.kind })
                .await;
            tracing::info!("Creating {}: {}", step.kind, request.name);

            match adapter.create_resource(step.kind, &request).await {
                Ok(resource) => {
                    observer
                        .on_event(&DeployEvent::StepCompleted {
                            resource: resource.clone(),
                        })
                        .await;
                    created.insert(step.kind, resource.name.clone());
                    resources.push(resource);
                }
                Err(e) => {
                    let error = e.to_string();
                    tracing::error!("Deployment step {} failed: {}", step.kind, error);
                    observer
                        .on_event(&DeployEvent::Failed {
                            error: error.clone(),
                        })
                        .await;
                    return Err(EngineError::Deployment(error));
                }
            }
        }

        tracing::info!("Deployment successful: {} resources created", resources.len());
        observer
            .on_event(&DeployEvent::Completed {
                resources: resources.clone(),
            })
            .await;

        Ok(DeployOutcome {
            provider: provider.to_string(),
            message: format!("{} infrastructure deployed successfully", adapter.display_name()),
            resources,
        })
    }

    fn validate_provider(&self, provider: &str) -> Result<()> {
        if !SUPPORTED_PROVIDERS.contains(&provider) {
            return Err(EngineError::Validation(format!(
                "Invalid provider. Must be one of: {}",
                SUPPORTED_PROVIDERS.join(", ")
            )));
        }
        if provider != "azure" {
            return Err(EngineError::Validation(format!(
                "{} deployment not yet implemented",
                provider.to_uppercase()
            )));
        }
        Ok(())
    }

    /// Fail fast with every missing credential listed, before any external
    /// call is attempted
    fn validate_credentials(&self, provider: &str) -> Result<()> {
        if provider != "azure" {
            return Ok(());
        }

        let mut missing = Vec::new();
        if self.config.azure.subscription_id.is_none() {
            missing.push("AZURE_SUBSCRIPTION_ID");
        }
        if self.config.azure.tenant_id.is_none() {
            missing.push("AZURE_TENANT_ID");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(EngineError::Validation(format!(
                "Missing Azure credentials: {}. Configure in Settings or set environment variables.",
                missing.join(", ")
            )))
        }
    }

    fn step_request(
        &self,
        step: &ResourceStep,
        options: &DeployOptions,
        created: &HashMap<ResourceKind, String>,
    ) -> Result<CreateRequest> {
        let org = &self.config.org_tag;
        let environment = self.config.environment;

        let resource_group = options
            .resource_group
            .clone()
            .unwrap_or_else(|| naming::resource_group_name(org, environment));
        let location = options
            .location
            .clone()
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string());

        let name = match step.kind {
            ResourceKind::ResourceGroup => resource_group.clone(),
            ResourceKind::StorageAccount => options
                .storage_account
                .clone()
                .unwrap_or_else(|| naming::storage_account_name(org, environment)),
            ResourceKind::StorageContainer => self.config.azure.storage_container.clone(),
            ResourceKind::FormRecognizer => options
                .form_recognizer_name
                .clone()
                .unwrap_or_else(|| naming::form_recognizer_name(org, environment)),
            ResourceKind::SearchService => options
                .search_service
                .clone()
                .unwrap_or_else(|| naming::search_service_name(org, environment)),
        };

        let depends_on = match step.depends_on {
            Some(dependency) => Some(created.get(&dependency).cloned().ok_or_else(|| {
                EngineError::Validation(format!(
                    "Step {} depends on {}, which was not provisioned",
                    step.kind, dependency
                ))
            })?),
            None => None,
        };

        Ok(CreateRequest {
            name,
            resource_group,
            location,
            depends_on,
        })
    }
}
