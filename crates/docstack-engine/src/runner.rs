//! Asynchronous deployment job runner
//!
//! Decouples a deploy request from the multi-minute provisioning run: the
//! producer enqueues on a channel, a single consumer task executes and
//! publishes progress through the [`ProgressStore`]. When no consumer is
//! available, the same provisioning algorithm runs synchronously and the
//! caller gets the final result instead of a deployment ID; callers must
//! handle both shapes.

use crate::deploy::{DeployEngine, DeployEvent, DeployObserver, DeployOptions, DeployOutcome, NullObserver};
use crate::error::Result;
use crate::progress::{
    DeploymentJob, ProgressStore, STATUS_COMPLETED, STATUS_FAILED, STATUS_STARTING,
};
use async_trait::async_trait;
use chrono::Utc;
use docstack_cloud::ResourceKind;
use docstack_core::{AuditEntry, AuditSink, AuditStatus};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

const QUEUE_DEPTH: usize = 16;

/// Response to a deploy submission
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SubmitOutcome {
    /// Work accepted onto the queue; poll the status URL
    Accepted {
        deployment_id: String,
        status_url: String,
    },
    /// Queue unavailable; the deployment ran synchronously
    Completed(DeployOutcome),
}

struct DeployRequest {
    deployment_id: String,
    provider: String,
    options: DeployOptions,
}

/// Produces deployment jobs and serves progress polls
pub struct JobRunner {
    engine: Arc<DeployEngine>,
    progress: Arc<dyn ProgressStore>,
    audit: Arc<dyn AuditSink>,
    tx: Option<mpsc::Sender<DeployRequest>>,
}

impl JobRunner {
    /// Start a runner with a background consumer task
    pub fn spawn(
        engine: Arc<DeployEngine>,
        progress: Arc<dyn ProgressStore>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let (tx, mut rx) = mpsc::channel::<DeployRequest>(QUEUE_DEPTH);

        let consumer_engine = engine.clone();
        let consumer_progress = progress.clone();
        let consumer_audit = audit.clone();
        tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                execute(&consumer_engine, &consumer_progress, &consumer_audit, request).await;
            }
        });

        Self {
            engine,
            progress,
            audit,
            tx: Some(tx),
        }
    }

    /// Runner without a consumer; every submission runs synchronously
    pub fn synchronous(
        engine: Arc<DeployEngine>,
        progress: Arc<dyn ProgressStore>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            engine,
            progress,
            audit,
            tx: None,
        }
    }

    /// Submit a deployment. Returns immediately with a deployment ID when
    /// the queue is up, or with the final result after a synchronous run.
    pub async fn submit(&self, provider: &str, options: DeployOptions) -> Result<SubmitOutcome> {
        if let Some(tx) = &self.tx {
            let deployment_id = new_deployment_id();
            self.progress
                .put(
                    &deployment_id,
                    DeploymentJob::new(STATUS_STARTING, "Starting deployment..."),
                )
                .await;

            let request = DeployRequest {
                deployment_id: deployment_id.clone(),
                provider: provider.to_string(),
                options,
            };

            match tx.send(request).await {
                Ok(()) => {
                    return Ok(SubmitOutcome::Accepted {
                        status_url: format!("/api/v1/cloud/deploy/{deployment_id}/status"),
                        deployment_id,
                    });
                }
                Err(mpsc::error::SendError(request)) => {
                    tracing::warn!("Deployment queue unavailable, running synchronously");
                    let outcome = self
                        .engine
                        .run(&request.provider, &request.options, &NullObserver)
                        .await?;
                    audit_deployed(&self.audit, &outcome).await;
                    return Ok(SubmitOutcome::Completed(outcome));
                }
            }
        }

        let outcome = self.engine.run(provider, &options, &NullObserver).await?;
        audit_deployed(&self.audit, &outcome).await;
        Ok(SubmitOutcome::Completed(outcome))
    }

    /// Current progress record for a deployment. `None` is ambiguous:
    /// expired-after-completion and never-existed look the same.
    pub async fn poll_status(&self, deployment_id: &str) -> Option<DeploymentJob> {
        self.progress.get(deployment_id).await
    }
}

/// Run one queued deployment. Every error is captured into a terminal
/// `failed` record; the consumer task must not die from a provisioning
/// failure.
async fn execute(
    engine: &DeployEngine,
    progress: &Arc<dyn ProgressStore>,
    audit: &Arc<dyn AuditSink>,
    request: DeployRequest,
) {
    let observer = ProgressObserver {
        store: progress.clone(),
        deployment_id: request.deployment_id.clone(),
    };

    match engine
        .run(&request.provider, &request.options, &observer)
        .await
    {
        Ok(outcome) => {
            audit_deployed(audit, &outcome).await;
            progress
                .put(
                    &request.deployment_id,
                    DeploymentJob::new(STATUS_COMPLETED, "Deployment complete")
                        .with_data(outcome.resources),
                )
                .await;
        }
        Err(e) => {
            tracing::error!("Deployment {} failed: {}", request.deployment_id, e);
            progress
                .put(
                    &request.deployment_id,
                    DeploymentJob::new(STATUS_FAILED, format!("Deployment failed: {e}")),
                )
                .await;
        }
    }
}

async fn audit_deployed(audit: &Arc<dyn AuditSink>, outcome: &DeployOutcome) {
    let entry = AuditEntry::new("cloud.deployed", AuditStatus::Success)
        .with_resource("CloudInfrastructure", None)
        .with_change_data(serde_json::json!({
            "provider": outcome.provider,
            "resources": outcome.resources,
        }));

    if let Err(e) = audit.log(entry).await {
        tracing::warn!("Failed to write audit entry: {}", e);
    }
}

/// Opaque, collision-resistant deployment ID
fn new_deployment_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("deploy_{}_{}", Utc::now().timestamp(), &suffix[..8])
}

struct ProgressObserver {
    store: Arc<dyn ProgressStore>,
    deployment_id: String,
}

#[async_trait]
impl DeployObserver for ProgressObserver {
    async fn on_event(&self, event: &DeployEvent) {
        // Terminal states are written by the consumer from the run result
        let job = match event {
            DeployEvent::Started { .. } => {
                DeploymentJob::new(STATUS_STARTING, "Starting deployment...")
            }
            DeployEvent::StepStarted { kind } => {
                DeploymentJob::new(kind.as_str(), step_message(*kind))
            }
            _ => return,
        };
        self.store.put(&self.deployment_id, job).await;
    }
}

fn step_message(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::ResourceGroup => "Creating resource group...",
        ResourceKind::StorageAccount => "Setting up storage account... (2-3 minutes)",
        ResourceKind::StorageContainer => "Creating storage container...",
        ResourceKind::FormRecognizer => "Deploying Form Recognizer... (2-3 minutes)",
        ResourceKind::SearchService => "Creating AI Search service... (3-4 minutes)",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::MemoryProgressStore;
    use crate::testutil::{FakeCloudProvider, test_config, test_registry};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Progress store that additionally records the status sequence per key
    struct RecordingStore {
        inner: MemoryProgressStore,
        statuses: Mutex<HashMap<String, Vec<String>>>,
    }

    impl RecordingStore {
        fn new() -> Self {
            Self {
                inner: MemoryProgressStore::new(),
                statuses: Mutex::new(HashMap::new()),
            }
        }

        fn sequence(&self, deployment_id: &str) -> Vec<String> {
            self.statuses
                .lock()
                .unwrap()
                .get(deployment_id)
                .cloned()
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl ProgressStore for RecordingStore {
        async fn put(&self, deployment_id: &str, job: DeploymentJob) {
            self.statuses
                .lock()
                .unwrap()
                .entry(deployment_id.to_string())
                .or_default()
                .push(job.status.clone());
            self.inner.put(deployment_id, job).await;
        }

        async fn get(&self, deployment_id: &str) -> Option<DeploymentJob> {
            self.inner.get(deployment_id).await
        }
    }

    fn engine(provider: Arc<FakeCloudProvider>) -> Arc<DeployEngine> {
        Arc::new(DeployEngine::new(
            test_registry(provider),
            Arc::new(test_config()),
        ))
    }

    fn sink() -> Arc<docstack_core::MemoryAuditSink> {
        Arc::new(docstack_core::MemoryAuditSink::new())
    }

    async fn wait_for_terminal(runner: &JobRunner, deployment_id: &str) -> DeploymentJob {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let Some(job) = runner.poll_status(deployment_id).await {
                    if job.is_terminal() {
                        return job;
                    }
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("deployment did not reach a terminal state")
    }

    #[tokio::test]
    async fn test_async_submit_progresses_to_completed() {
        let provider = Arc::new(FakeCloudProvider::new());
        let store = Arc::new(RecordingStore::new());
        let audit = sink();
        let runner = JobRunner::spawn(engine(provider), store.clone(), audit.clone());

        let outcome = runner
            .submit("azure", DeployOptions::default())
            .await
            .unwrap();

        let deployment_id = match outcome {
            SubmitOutcome::Accepted {
                deployment_id,
                status_url,
            } => {
                assert!(deployment_id.starts_with("deploy_"));
                assert!(status_url.contains(&deployment_id));
                deployment_id
            }
            SubmitOutcome::Completed(_) => panic!("expected async acceptance"),
        };

        let terminal = wait_for_terminal(&runner, &deployment_id).await;
        assert_eq!(terminal.status, STATUS_COMPLETED);
        assert_eq!(terminal.data.as_ref().map(Vec::len), Some(5));

        // Monotonic phase sequence ending in exactly one terminal status
        let statuses = store.sequence(&deployment_id);
        let positions = record_positions(&statuses);
        let expected = [
            STATUS_STARTING,
            "resource_group",
            "storage",
            "storage_container",
            "form_recognizer",
            "search",
            STATUS_COMPLETED,
        ];
        for pair in expected.windows(2) {
            assert!(
                positions[pair[0]] < positions[pair[1]],
                "{} did not precede {}",
                pair[0],
                pair[1]
            );
        }
        let terminals = statuses
            .iter()
            .filter(|s| *s == STATUS_COMPLETED || *s == STATUS_FAILED)
            .count();
        assert_eq!(terminals, 1);

        let deployed = audit
            .entries(&docstack_core::AuditQuery {
                action: Some("cloud.deployed".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(deployed.len(), 1);
    }

    fn record_positions(sequence: &[String]) -> HashMap<&str, usize> {
        let mut positions = HashMap::new();
        for (idx, status) in sequence.iter().enumerate() {
            positions.entry(status.as_str()).or_insert(idx);
        }
        positions
    }

    #[tokio::test]
    async fn test_provisioning_error_becomes_failed_record() {
        let provider =
            Arc::new(FakeCloudProvider::new().fail_on(docstack_cloud::ResourceKind::SearchService));
        let store = Arc::new(RecordingStore::new());
        let runner = JobRunner::spawn(engine(provider), store, sink());

        let outcome = runner
            .submit("azure", DeployOptions::default())
            .await
            .unwrap();
        let deployment_id = match outcome {
            SubmitOutcome::Accepted { deployment_id, .. } => deployment_id,
            SubmitOutcome::Completed(_) => panic!("expected async acceptance"),
        };

        let terminal = wait_for_terminal(&runner, &deployment_id).await;
        assert_eq!(terminal.status, STATUS_FAILED);
        assert!(terminal.message.contains("simulated failure"));
        assert!(terminal.data.is_none());
    }

    #[tokio::test]
    async fn test_synchronous_fallback_returns_result() {
        let provider = Arc::new(FakeCloudProvider::new());
        let store = Arc::new(MemoryProgressStore::new());
        let runner = JobRunner::synchronous(engine(provider), store, sink());

        let outcome = runner
            .submit("azure", DeployOptions::default())
            .await
            .unwrap();

        match outcome {
            SubmitOutcome::Completed(result) => {
                assert_eq!(result.resources.len(), 5);
            }
            SubmitOutcome::Accepted { .. } => panic!("expected synchronous result"),
        }
    }

    #[tokio::test]
    async fn test_synchronous_fallback_propagates_validation_error() {
        let provider = Arc::new(FakeCloudProvider::new());
        let store = Arc::new(MemoryProgressStore::new());
        let runner = JobRunner::synchronous(engine(provider), store, sink());

        let err = runner
            .submit("digitalocean", DeployOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }
}
