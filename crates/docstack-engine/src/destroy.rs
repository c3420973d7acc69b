//! Destroy / backup / cleanup workflow
//!
//! Strictly sequential, each stage gating the next: a successful provenance
//! backup is mandatory before the adapter's destroy is ever invoked, and
//! the record-store sweep runs only after the destroy call succeeded.
//! Cleanup failures do not fail the destroy: the cloud resources are
//! already gone and must not appear otherwise.

use crate::backup::{BackupRecord, BackupService};
use crate::error::{EngineError, Result};
use docstack_cloud::ProviderRegistry;
use docstack_core::{AuditEntry, AuditSink, AuditStatus, RecordStore};
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Poll cadence for confirming a resource group is gone
pub const DESTROY_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Give up confirming after this long and report still-in-progress
pub const DESTROY_POLL_BUDGET: Duration = Duration::from_secs(300);

/// Per-provider record counts removed by the cleanup sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupCounts {
    pub chunks_deleted: usize,
    pub index_entries_deleted: usize,
    pub processing_jobs_deleted: usize,
    pub documents_reset: usize,
}

/// Cleanup result reported alongside an otherwise-successful destroy
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CleanupReport {
    Cleaned(CleanupCounts),
    Failed { error: String },
}

/// Overall result of a destroy request
#[derive(Debug, Clone, Serialize)]
pub struct DestroyReport {
    pub message: String,
    pub backup_file: PathBuf,
    pub backup_size: String,
    pub backup_size_bytes: u64,
    pub database_cleanup: CleanupReport,
}

/// Backup-gated teardown of provider infrastructure plus reconciliation of
/// the records that referenced it
pub struct TeardownService {
    registry: Arc<ProviderRegistry>,
    records: Arc<dyn RecordStore>,
    audit: Arc<dyn AuditSink>,
    backup: BackupService,
}

impl TeardownService {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        records: Arc<dyn RecordStore>,
        audit: Arc<dyn AuditSink>,
        backup: BackupService,
    ) -> Self {
        Self {
            registry,
            records,
            audit,
            backup,
        }
    }

    /// Back up provenance data, destroy the resource group, then sweep the
    /// records that referenced the provider's infrastructure.
    pub async fn destroy(
        &self,
        provider_name: &str,
        resource_group: &str,
        user: Option<&str>,
    ) -> Result<DestroyReport> {
        tracing::info!(
            "Creating database backup before destroying {}",
            resource_group
        );
        let backup = self.backup.run().await?;
        tracing::info!("Database backed up to {}", backup.backup_file.display());

        let adapter = self.registry.cloud(Some(provider_name))?;
        let outcome = adapter.destroy_resource_group(resource_group).await;
        if !outcome.success {
            return Err(EngineError::Destroy(
                outcome
                    .error
                    .unwrap_or_else(|| "unknown destroy failure".to_string()),
            ));
        }

        let cleanup = self.cleanup(provider_name).await;

        self.audit_destroyed(provider_name, resource_group, user, &backup, &cleanup)
            .await;

        Ok(DestroyReport {
            message: outcome.message.unwrap_or_default(),
            backup_file: backup.backup_file,
            backup_size: backup.size_formatted,
            backup_size_bytes: backup.size_bytes,
            database_cleanup: cleanup,
        })
    }

    /// Remove every chunk, index entry and processing job tied to the
    /// provider, then reset the affected documents for reprocessing.
    /// Errors are reported, never raised.
    async fn cleanup(&self, provider: &str) -> CleanupReport {
        match self.cleanup_inner(provider).await {
            Ok(counts) => {
                tracing::info!(
                    "Cleaned up {} chunks, {} index entries, {} jobs; {} documents reset",
                    counts.chunks_deleted,
                    counts.index_entries_deleted,
                    counts.processing_jobs_deleted,
                    counts.documents_reset
                );
                CleanupReport::Cleaned(counts)
            }
            Err(e) => {
                tracing::warn!("Database cleanup failed: {}", e);
                CleanupReport::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    async fn cleanup_inner(&self, provider: &str) -> docstack_core::Result<CleanupCounts> {
        let mut counts = CleanupCounts::default();

        let affected_versions = self.records.versions_by_source_cloud(provider).await?;
        let mut document_ids: HashSet<String> = HashSet::new();

        for version in &affected_versions {
            counts.chunks_deleted += self.records.delete_chunks_for_version(&version.id).await?;
            document_ids.insert(version.document_id.clone());
        }

        counts.index_entries_deleted = self.records.delete_index_entries(provider).await?;
        counts.processing_jobs_deleted = self.records.delete_processing_jobs(provider).await?;

        let ids: Vec<String> = document_ids.into_iter().collect();
        counts.documents_reset = self.records.reset_documents(&ids).await?;

        Ok(counts)
    }

    async fn audit_destroyed(
        &self,
        provider: &str,
        resource_group: &str,
        user: Option<&str>,
        backup: &BackupRecord,
        cleanup: &CleanupReport,
    ) {
        let mut entry = AuditEntry::new("cloud.destroyed", AuditStatus::Success)
            .with_resource("CloudInfrastructure", None)
            .with_change_data(serde_json::json!({
                "provider": provider,
                "resource_group": resource_group,
                "backup_file": backup.backup_file,
                "backup_size": backup.size_formatted,
                "database_cleanup": cleanup,
            }));
        if let Some(user) = user {
            entry = entry.with_user(user);
        }

        // The teardown already happened; a sink failure is not a reason to
        // report it as failed
        if let Err(e) = self.audit.log(entry).await {
            tracing::warn!("Failed to write audit entry: {}", e);
        }
    }

    /// Poll inventory until the group disappears. Returns `false` when the
    /// budget runs out and deletion is still in progress.
    pub async fn wait_for_group_gone(
        &self,
        provider_name: &str,
        resource_group: &str,
        interval: Duration,
        budget: Duration,
    ) -> Result<bool> {
        let adapter = self.registry.cloud(Some(provider_name))?;
        let deadline = tokio::time::Instant::now() + budget;

        loop {
            let inventory = adapter.get_resources().await;
            if inventory.success && !inventory.contains_group(resource_group) {
                return Ok(true);
            }

            if tokio::time::Instant::now() >= deadline {
                tracing::info!(
                    "Resource group {} still being deleted after {:?}",
                    resource_group,
                    budget
                );
                return Ok(false);
            }

            tokio::time::sleep(interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{FakeCloudProvider, test_registry};
    use async_trait::async_trait;
    use docstack_cloud::{CommandOutput, CommandRunner, Inventory, ResourceGroupInfo};
    use docstack_config::DatabaseConfig;
    use docstack_core::{
        AuditQuery, Document, DocumentChunk, DocumentStatus, DocumentVersion, IndexEntry,
        MemoryAuditSink, MemoryRecordStore, ProcessingJob,
    };

    struct DumpRunner;

    #[async_trait]
    impl CommandRunner for DumpRunner {
        async fn run_with_env(
            &self,
            _program: &str,
            _args: &[&str],
            _env: &[(&str, &str)],
        ) -> docstack_cloud::Result<CommandOutput> {
            Ok(CommandOutput {
                exit_code: 0,
                stdout: "-- dump".to_string(),
                stderr: String::new(),
            })
        }
    }

    fn backup_service(dir: &std::path::Path, adapter: &str) -> BackupService {
        BackupService::new(
            Arc::new(DumpRunner),
            DatabaseConfig {
                adapter: adapter.to_string(),
                ..Default::default()
            },
            dir,
        )
    }

    async fn seeded_records() -> Arc<MemoryRecordStore> {
        let records = Arc::new(MemoryRecordStore::new());

        records
            .insert_document(Document {
                id: "doc-1".to_string(),
                title: "case file".to_string(),
                status: DocumentStatus::Ready,
                current_version: Some("ver-1".to_string()),
            })
            .await;
        records
            .insert_version(DocumentVersion {
                id: "ver-1".to_string(),
                document_id: "doc-1".to_string(),
                source_cloud: Some("azure".to_string()),
            })
            .await;
        records
            .insert_chunk(
                DocumentChunk {
                    id: "chunk-1".to_string(),
                    version_id: "ver-1".to_string(),
                    content: "page".to_string(),
                },
                Some(vec![0.5]),
            )
            .await;
        records
            .insert_index_entry(IndexEntry {
                id: "idx-1".to_string(),
                provider: "azure".to_string(),
                chunk_id: "chunk-1".to_string(),
            })
            .await;
        records
            .insert_job(ProcessingJob {
                id: "job-1".to_string(),
                provider: "azure".to_string(),
                document_id: "doc-1".to_string(),
            })
            .await;

        // Untouched by the azure teardown
        records
            .insert_document(Document {
                id: "doc-2".to_string(),
                title: "local only".to_string(),
                status: DocumentStatus::Ready,
                current_version: Some("ver-2".to_string()),
            })
            .await;
        records
            .insert_version(DocumentVersion {
                id: "ver-2".to_string(),
                document_id: "doc-2".to_string(),
                source_cloud: None,
            })
            .await;

        records
    }

    #[tokio::test]
    async fn test_backup_failure_blocks_destroy() {
        let provider = Arc::new(FakeCloudProvider::new());
        let dir = tempfile::tempdir().unwrap();
        let service = TeardownService::new(
            test_registry(provider.clone()),
            seeded_records().await,
            Arc::new(MemoryAuditSink::new()),
            backup_service(dir.path(), "sqlite3"),
        );

        let err = service.destroy("azure", "uts-dev-rg", None).await.unwrap_err();

        assert_eq!(err.code(), "BACKUP_FAILED");
        assert_eq!(provider.destroy_count(), 0);
    }

    #[tokio::test]
    async fn test_destroy_sweeps_provider_records_and_audits() {
        let provider = Arc::new(FakeCloudProvider::new());
        let records = seeded_records().await;
        let audit = Arc::new(MemoryAuditSink::new());
        let dir = tempfile::tempdir().unwrap();
        let service = TeardownService::new(
            test_registry(provider.clone()),
            records.clone(),
            audit.clone(),
            backup_service(dir.path(), "postgresql"),
        );

        let report = service
            .destroy("azure", "uts-dev-rg", Some("admin"))
            .await
            .unwrap();

        assert!(report.message.contains("deletion initiated"));
        assert_eq!(provider.destroy_count(), 1);

        match &report.database_cleanup {
            CleanupReport::Cleaned(counts) => {
                assert_eq!(
                    counts,
                    &CleanupCounts {
                        chunks_deleted: 1,
                        index_entries_deleted: 1,
                        processing_jobs_deleted: 1,
                        documents_reset: 1,
                    }
                );
            }
            CleanupReport::Failed { error } => panic!("cleanup failed: {error}"),
        }

        assert_eq!(records.chunk_count().await, 0);
        assert_eq!(records.embedding_count().await, 0);
        assert_eq!(records.index_entry_count().await, 0);
        assert_eq!(records.job_count().await, 0);

        let affected = records.document("doc-1").await.unwrap();
        assert_eq!(affected.status, DocumentStatus::Pending);
        assert!(affected.current_version.is_none());

        let untouched = records.document("doc-2").await.unwrap();
        assert_eq!(untouched.status, DocumentStatus::Ready);

        let entries = audit
            .entries(&AuditQuery {
                action: Some("cloud.destroyed".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].user.as_deref(), Some("admin"));
        let change_data = entries[0].change_data.as_ref().unwrap();
        assert_eq!(change_data["resource_group"], "uts-dev-rg");
    }

    #[tokio::test]
    async fn test_adapter_failure_stops_before_cleanup() {
        let provider = Arc::new(FakeCloudProvider::new().failing_destroy());
        let records = seeded_records().await;
        let dir = tempfile::tempdir().unwrap();
        let service = TeardownService::new(
            test_registry(provider),
            records.clone(),
            Arc::new(MemoryAuditSink::new()),
            backup_service(dir.path(), "postgresql"),
        );

        let err = service.destroy("azure", "rg-gone", None).await.unwrap_err();

        assert_eq!(err.code(), "DESTROY_FAILED");
        // Records untouched: cleanup never ran
        assert_eq!(records.chunk_count().await, 1);
        assert_eq!(records.index_entry_count().await, 1);
    }

    struct BrokenRecordStore;

    #[async_trait]
    impl RecordStore for BrokenRecordStore {
        async fn versions_by_source_cloud(
            &self,
            _provider: &str,
        ) -> docstack_core::Result<Vec<DocumentVersion>> {
            Err(docstack_core::CoreError::Store(
                "connection reset".to_string(),
            ))
        }

        async fn delete_chunks_for_version(
            &self,
            _version_id: &str,
        ) -> docstack_core::Result<usize> {
            Ok(0)
        }

        async fn delete_index_entries(&self, _provider: &str) -> docstack_core::Result<usize> {
            Ok(0)
        }

        async fn delete_processing_jobs(&self, _provider: &str) -> docstack_core::Result<usize> {
            Ok(0)
        }

        async fn reset_documents(&self, _document_ids: &[String]) -> docstack_core::Result<usize> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_cleanup_failure_does_not_fail_destroy() {
        let provider = Arc::new(FakeCloudProvider::new());
        let dir = tempfile::tempdir().unwrap();
        let service = TeardownService::new(
            test_registry(provider),
            Arc::new(BrokenRecordStore),
            Arc::new(MemoryAuditSink::new()),
            backup_service(dir.path(), "postgresql"),
        );

        let report = service.destroy("azure", "uts-dev-rg", None).await.unwrap();

        match report.database_cleanup {
            CleanupReport::Failed { error } => assert!(error.contains("connection reset")),
            CleanupReport::Cleaned(_) => panic!("expected cleanup failure report"),
        }
    }

    fn inventory_with_group(name: &str) -> Inventory {
        Inventory::ok(vec![ResourceGroupInfo {
            name: name.to_string(),
            location: "eastasia".to_string(),
            resource_count: 0,
            resources: Vec::new(),
            warnings: Vec::new(),
        }])
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_group_gone_polls_until_absent() {
        let provider = Arc::new(FakeCloudProvider::new());
        provider.push_inventory(inventory_with_group("uts-dev-rg"));
        provider.push_inventory(inventory_with_group("uts-dev-rg"));
        // Third poll: drained queue falls back to an empty inventory

        let dir = tempfile::tempdir().unwrap();
        let service = TeardownService::new(
            test_registry(provider),
            seeded_records().await,
            Arc::new(MemoryAuditSink::new()),
            backup_service(dir.path(), "postgresql"),
        );

        let gone = service
            .wait_for_group_gone(
                "azure",
                "uts-dev-rg",
                DESTROY_POLL_INTERVAL,
                DESTROY_POLL_BUDGET,
            )
            .await
            .unwrap();
        assert!(gone);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_group_gone_gives_up_after_budget() {
        let provider = Arc::new(FakeCloudProvider::new());
        // 5 minutes at one poll per 5 seconds, plus slack
        for _ in 0..70 {
            provider.push_inventory(inventory_with_group("uts-dev-rg"));
        }

        let dir = tempfile::tempdir().unwrap();
        let service = TeardownService::new(
            test_registry(provider),
            seeded_records().await,
            Arc::new(MemoryAuditSink::new()),
            backup_service(dir.path(), "postgresql"),
        );

        let gone = service
            .wait_for_group_gone(
                "azure",
                "uts-dev-rg",
                DESTROY_POLL_INTERVAL,
                DESTROY_POLL_BUDGET,
            )
            .await
            .unwrap();
        assert!(!gone);
    }
}
