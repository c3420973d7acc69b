//! Audit sink for security and compliance tracking
//!
//! Entries are append-only; nothing in the normal flow updates or deletes
//! them. The failed-attempt aggregate backs lockout-style policies.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Action recorded when an authentication attempt fails
pub const LOGIN_FAILED_ACTION: &str = "login_failed";

/// Outcome of an audited action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Success,
    Failure,
}

impl std::fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditStatus::Success => write!(f, "success"),
            AuditStatus::Failure => write!(f, "failure"),
        }
    }
}

/// One audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub action: String,

    /// Absent for unauthenticated failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    pub status: AuditStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// What changed, as structured data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_data: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(action: impl Into<String>, status: AuditStatus) -> Self {
        Self {
            action: action.into(),
            user: None,
            status,
            resource_type: None,
            resource_id: None,
            ip_address: None,
            user_agent: None,
            change_data: None,
            metadata: None,
            error_message: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_resource(
        mut self,
        resource_type: impl Into<String>,
        resource_id: Option<String>,
    ) -> Self {
        self.resource_type = Some(resource_type.into());
        self.resource_id = resource_id;
        self
    }

    pub fn with_change_data(mut self, change_data: serde_json::Value) -> Self {
        self.change_data = Some(change_data);
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_error(mut self, error_message: impl Into<String>) -> Self {
        self.error_message = Some(error_message.into());
        self
    }
}

/// Filter for audit queries; empty fields match everything
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    pub user: Option<String>,
    pub action: Option<String>,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl AuditQuery {
    fn matches(&self, entry: &AuditEntry) -> bool {
        if let Some(user) = &self.user {
            if entry.user.as_deref() != Some(user.as_str()) {
                return false;
            }
        }
        if let Some(action) = &self.action {
            if &entry.action != action {
                return false;
            }
        }
        if let Some(resource_type) = &self.resource_type {
            if entry.resource_type.as_deref() != Some(resource_type.as_str()) {
                return false;
            }
        }
        if let Some(resource_id) = &self.resource_id {
            if entry.resource_id.as_deref() != Some(resource_id.as_str()) {
                return false;
            }
        }
        if let Some(since) = self.since {
            if entry.created_at <= since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if entry.created_at > until {
                return false;
            }
        }
        true
    }
}

/// Append-only audit log boundary
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn log(&self, entry: AuditEntry) -> Result<()>;

    /// Entries matching the query, most recent first
    async fn entries(&self, query: &AuditQuery) -> Result<Vec<AuditEntry>>;

    /// Failed attempts recorded for a principal since the given time.
    /// Matches failure entries whose metadata names the principal as the
    /// attempted login.
    async fn failed_attempts(&self, principal: &str, since: DateTime<Utc>) -> Result<usize>;
}

/// In-memory [`AuditSink`] for tests and local runs
#[derive(Default)]
pub struct MemoryAuditSink {
    entries: RwLock<Vec<AuditEntry>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn log(&self, entry: AuditEntry) -> Result<()> {
        tracing::debug!("audit: {} ({})", entry.action, entry.status);
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn entries(&self, query: &AuditQuery) -> Result<Vec<AuditEntry>> {
        let entries = self.entries.read().await;
        let mut matched: Vec<AuditEntry> = entries
            .iter()
            .filter(|e| query.matches(e))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matched)
    }

    async fn failed_attempts(&self, principal: &str, since: DateTime<Utc>) -> Result<usize> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|e| {
                e.action == LOGIN_FAILED_ACTION
                    && e.status == AuditStatus::Failure
                    && e.created_at > since
                    && e.metadata
                        .as_ref()
                        .and_then(|m| m.get("attempted_login"))
                        .and_then(|v| v.as_str())
                        == Some(principal)
            })
            .count())
    }
}
