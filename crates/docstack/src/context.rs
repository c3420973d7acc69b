//! Process wiring
//!
//! Builds the configuration object once and hands it to the registry and
//! engines by reference. The in-memory record store and audit sink stand
//! in for the application database until this binary is wired against it.

use docstack_cloud::{CommandRunner, PreferredProviders, ProviderRegistry, SystemRunner};
use docstack_cloud_azure::{AzureProvider, AzureSettings};
use docstack_config::AppConfig;
use docstack_core::{AuditSink, MemoryAuditSink, MemoryRecordStore, RecordStore};
use docstack_engine::{
    BackupService, DeployEngine, JobRunner, MemoryProgressStore, ProgressStore, TeardownService,
};
use std::sync::Arc;

pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub registry: Arc<ProviderRegistry>,
    pub runner: JobRunner,
    pub teardown: TeardownService,
}

impl AppContext {
    pub fn build() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let command_runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);

        let azure = Arc::new(AzureProvider::new(
            AzureSettings {
                resource_group_prefix: config.azure.resource_group_prefix.clone(),
            },
            command_runner.clone(),
        ));

        let mut registry = ProviderRegistry::new(PreferredProviders {
            storage: config.preferred.storage.clone(),
            decomposer: config.preferred.decomposer.clone(),
            embedder: config.preferred.embedder.clone(),
            indexer: config.preferred.indexer.clone(),
            cloud: config.preferred.cloud.clone(),
        });
        registry.register_cloud(azure);
        let registry = Arc::new(registry);

        let engine = Arc::new(DeployEngine::new(registry.clone(), config.clone()));
        let progress: Arc<dyn ProgressStore> = Arc::new(MemoryProgressStore::new());

        let records: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        let audit: Arc<dyn AuditSink> = Arc::new(MemoryAuditSink::new());
        let runner = JobRunner::spawn(engine, progress, audit.clone());
        let backup = BackupService::new(
            command_runner,
            config.database.clone(),
            &config.backup_dir,
        );
        let teardown = TeardownService::new(registry.clone(), records, audit, backup);

        Ok(Self {
            config,
            registry,
            runner,
            teardown,
        })
    }
}
