//! docstack provisioning engine
//!
//! The control loop behind `docstack deploy` and `docstack destroy`:
//!
//! - [`DeployEngine`] walks a dependency-ordered resource plan against a
//!   cloud provider adapter, skipping already-correct resources
//! - [`JobRunner`] runs deployments in the background and publishes
//!   progress into a TTL-bounded [`ProgressStore`] for polling clients
//! - [`TeardownService`] gates destruction behind a mandatory provenance
//!   backup and reconciles dependent records afterwards

pub mod backup;
pub mod deploy;
pub mod destroy;
pub mod error;
pub mod naming;
pub mod plan;
pub mod progress;
pub mod runner;
pub mod status;

#[cfg(test)]
pub(crate) mod testutil;

// Re-exports
pub use backup::{BackupRecord, BackupService, PROVENANCE_TABLES, format_bytes};
pub use deploy::{
    DEFAULT_LOCATION, DeployEngine, DeployEvent, DeployObserver, DeployOptions, DeployOutcome,
    NullObserver, SUPPORTED_PROVIDERS,
};
pub use destroy::{
    CleanupCounts, CleanupReport, DESTROY_POLL_BUDGET, DESTROY_POLL_INTERVAL, DestroyReport,
    TeardownService,
};
pub use error::{EngineError, Result};
pub use plan::{ResourceStep, default_plan, topo_sort};
pub use progress::{
    DeploymentJob, MemoryProgressStore, PROGRESS_TTL, ProgressStore, STATUS_COMPLETED,
    STATUS_FAILED, STATUS_STARTING,
};
pub use runner::{JobRunner, SubmitOutcome};
pub use status::{ProviderStatus, provider_status};
