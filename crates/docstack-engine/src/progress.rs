//! Deployment progress records
//!
//! Each deployment writes a single record keyed by its deployment ID; a
//! write overwrites the previous record, it is not an append log. Records
//! expire after a fixed retention window regardless of terminal state: a
//! deliberate fire-and-forget visibility window, not a permanent record.
//! After expiry a poll yields nothing, which callers must treat as
//! ambiguous (finished-and-expired, or never existed).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docstack_cloud::ProvisionedResource;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Retention window for progress records
pub const PROGRESS_TTL: Duration = Duration::from_secs(3600);

pub const STATUS_STARTING: &str = "starting";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_FAILED: &str = "failed";

/// Progress record for one deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentJob {
    /// `starting`, a step name, `completed` or `failed`
    pub status: String,

    pub message: String,

    /// Manifest, present only on `completed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<ProvisionedResource>>,

    pub updated_at: DateTime<Utc>,
}

impl DeploymentJob {
    pub fn new(status: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            message: message.into(),
            data: None,
            updated_at: Utc::now(),
        }
    }

    pub fn with_data(mut self, data: Vec<ProvisionedResource>) -> Self {
        self.data = Some(data);
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.status == STATUS_COMPLETED || self.status == STATUS_FAILED
    }
}

/// Repository over the key-value store that publishes deployment progress
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Write the record for a deployment, replacing any previous one and
    /// restarting its retention window
    async fn put(&self, deployment_id: &str, job: DeploymentJob);

    /// Current record, or `None` once expired or never written
    async fn get(&self, deployment_id: &str) -> Option<DeploymentJob>;
}

/// In-process [`ProgressStore`] with per-key expiry
pub struct MemoryProgressStore {
    ttl: Duration,
    entries: RwLock<HashMap<String, (DeploymentJob, Instant)>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::with_ttl(PROGRESS_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryProgressStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn put(&self, deployment_id: &str, job: DeploymentJob) {
        let deadline = Instant::now() + self.ttl;
        self.entries
            .write()
            .await
            .insert(deployment_id.to_string(), (job, deadline));
    }

    async fn get(&self, deployment_id: &str) -> Option<DeploymentJob> {
        let mut entries = self.entries.write().await;
        match entries.get(deployment_id) {
            Some((job, deadline)) if *deadline > Instant::now() => Some(job.clone()),
            Some(_) => {
                entries.remove(deployment_id);
                None
            }
            None => None,
        }
    }
}
