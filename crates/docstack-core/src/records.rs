//! Document pipeline records and the record-store boundary
//!
//! Documents and their versions are provenance data and survive
//! infrastructure teardown. Chunks, embeddings, index entries and
//! processing jobs are derived from a specific provider's infrastructure
//! and are swept when that infrastructure is destroyed.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

/// Processing state of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Awaiting (re)processing
    Pending,
    /// Being decomposed/embedded/indexed
    Processing,
    /// Fully processed and searchable
    Ready,
    /// Processing failed
    Failed,
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentStatus::Pending => write!(f, "pending"),
            DocumentStatus::Processing => write!(f, "processing"),
            DocumentStatus::Ready => write!(f, "ready"),
            DocumentStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Top-level document record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub status: DocumentStatus,
    /// Version currently served to readers; cleared when the backing
    /// infrastructure goes away
    pub current_version: Option<String>,
}

/// One processed version of a document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentVersion {
    pub id: String,
    pub document_id: String,
    /// Cloud provider whose infrastructure processed this version
    pub source_cloud: Option<String>,
}

/// Content chunk of a processed version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: String,
    pub version_id: String,
    pub content: String,
}

/// Vector embedding of one chunk; deleted with its chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentEmbedding {
    pub chunk_id: String,
    pub vector: Vec<f32>,
}

/// Search-index entry tagged with the provider that hosts the index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub provider: String,
    pub chunk_id: String,
}

/// Pipeline processing job tagged with the provider it runs against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingJob {
    pub id: String,
    pub provider: String,
    pub document_id: String,
}

/// Record-store boundary consumed by the post-destroy cleanup sweep
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Versions whose source infrastructure belongs to the given provider
    async fn versions_by_source_cloud(&self, provider: &str) -> Result<Vec<DocumentVersion>>;

    /// Delete all chunks of a version, cascading to their embeddings.
    /// Returns the number of chunks removed.
    async fn delete_chunks_for_version(&self, version_id: &str) -> Result<usize>;

    /// Delete all index entries tagged with the provider
    async fn delete_index_entries(&self, provider: &str) -> Result<usize>;

    /// Delete all processing jobs tagged with the provider
    async fn delete_processing_jobs(&self, provider: &str) -> Result<usize>;

    /// Reset documents to pending with no current version. Returns the
    /// number of documents updated.
    async fn reset_documents(&self, document_ids: &[String]) -> Result<usize>;
}

#[derive(Default)]
struct RecordData {
    documents: HashMap<String, Document>,
    versions: HashMap<String, DocumentVersion>,
    chunks: HashMap<String, DocumentChunk>,
    embeddings: HashMap<String, DocumentEmbedding>,
    index_entries: HashMap<String, IndexEntry>,
    jobs: HashMap<String, ProcessingJob>,
}

/// In-memory [`RecordStore`] for tests and local runs
#[derive(Default)]
pub struct MemoryRecordStore {
    data: RwLock<RecordData>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_document(&self, document: Document) {
        self.data
            .write()
            .await
            .documents
            .insert(document.id.clone(), document);
    }

    pub async fn insert_version(&self, version: DocumentVersion) {
        self.data
            .write()
            .await
            .versions
            .insert(version.id.clone(), version);
    }

    pub async fn insert_chunk(&self, chunk: DocumentChunk, embedding: Option<Vec<f32>>) {
        let mut data = self.data.write().await;
        if let Some(vector) = embedding {
            data.embeddings.insert(
                chunk.id.clone(),
                DocumentEmbedding {
                    chunk_id: chunk.id.clone(),
                    vector,
                },
            );
        }
        data.chunks.insert(chunk.id.clone(), chunk);
    }

    pub async fn insert_index_entry(&self, entry: IndexEntry) {
        self.data
            .write()
            .await
            .index_entries
            .insert(entry.id.clone(), entry);
    }

    pub async fn insert_job(&self, job: ProcessingJob) {
        self.data.write().await.jobs.insert(job.id.clone(), job);
    }

    pub async fn document(&self, id: &str) -> Option<Document> {
        self.data.read().await.documents.get(id).cloned()
    }

    pub async fn chunk_count(&self) -> usize {
        self.data.read().await.chunks.len()
    }

    pub async fn embedding_count(&self) -> usize {
        self.data.read().await.embeddings.len()
    }

    pub async fn index_entry_count(&self) -> usize {
        self.data.read().await.index_entries.len()
    }

    pub async fn job_count(&self) -> usize {
        self.data.read().await.jobs.len()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn versions_by_source_cloud(&self, provider: &str) -> Result<Vec<DocumentVersion>> {
        let data = self.data.read().await;
        Ok(data
            .versions
            .values()
            .filter(|v| v.source_cloud.as_deref() == Some(provider))
            .cloned()
            .collect())
    }

    async fn delete_chunks_for_version(&self, version_id: &str) -> Result<usize> {
        let mut data = self.data.write().await;
        let doomed: Vec<String> = data
            .chunks
            .values()
            .filter(|c| c.version_id == version_id)
            .map(|c| c.id.clone())
            .collect();

        for chunk_id in &doomed {
            data.chunks.remove(chunk_id);
            data.embeddings.remove(chunk_id);
        }
        Ok(doomed.len())
    }

    async fn delete_index_entries(&self, provider: &str) -> Result<usize> {
        let mut data = self.data.write().await;
        let before = data.index_entries.len();
        data.index_entries.retain(|_, e| e.provider != provider);
        Ok(before - data.index_entries.len())
    }

    async fn delete_processing_jobs(&self, provider: &str) -> Result<usize> {
        let mut data = self.data.write().await;
        let before = data.jobs.len();
        data.jobs.retain(|_, j| j.provider != provider);
        Ok(before - data.jobs.len())
    }

    async fn reset_documents(&self, document_ids: &[String]) -> Result<usize> {
        let targets: HashSet<&String> = document_ids.iter().collect();
        let mut data = self.data.write().await;
        let mut updated = 0;

        for document in data.documents.values_mut() {
            if targets.contains(&document.id) {
                document.status = DocumentStatus::Pending;
                document.current_version = None;
                updated += 1;
            }
        }
        Ok(updated)
    }
}
