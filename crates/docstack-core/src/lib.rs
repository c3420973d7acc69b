//! docstack domain records and boundary traits
//!
//! The deployment core does not own the relational schema behind the
//! document pipeline; it consumes it through two narrow boundaries defined
//! here:
//!
//! - [`RecordStore`]: query/delete dependent records by cloud provider tag
//!   and bulk-reset documents, used by the post-destroy reconciliation sweep
//! - [`AuditSink`]: append-only log of security/compliance-relevant actions
//!
//! In-memory implementations back the test suites and the CLI's local mode;
//! a database-backed implementation lives with the application that owns
//! the schema.

pub mod audit;
pub mod error;
pub mod records;

pub use audit::{AuditEntry, AuditQuery, AuditSink, AuditStatus, MemoryAuditSink};
pub use error::{CoreError, Result};
pub use records::{
    Document, DocumentChunk, DocumentEmbedding, DocumentStatus, DocumentVersion, IndexEntry,
    MemoryRecordStore, ProcessingJob, RecordStore,
};
