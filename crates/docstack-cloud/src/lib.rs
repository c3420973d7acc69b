//! docstack Cloud Infrastructure
//!
//! This crate provides the cloud provider abstraction for docstack,
//! enabling provisioning and teardown of document-processing
//! infrastructure across multiple providers.
//!
//! # Supported Providers
//!
//! - **Azure**: Resource groups, storage, Form Recognizer, AI Search
//!   (via the `az` CLI, see `docstack-cloud-azure`)
//! - **AWS** / **GCP**: registered identifiers, adapters not yet implemented
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 docstack CLI                     │
//! │           (deploy / destroy / resources)         │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │               docstack-cloud                     │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │          Provider Abstraction             │   │
//! │  │  trait CloudProvider { ... }              │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │   Registry   │  │ CommandRunner │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼───────┐
//! │     azure     │
//! │   provider    │
//! └───────────────┘
//! ```

pub mod error;
pub mod exec;
pub mod provider;
pub mod registry;
pub mod resource;

// Re-exports
pub use error::{CloudError, Result};
pub use exec::{CommandOutput, CommandRunner, SystemRunner, extract_json};
pub use provider::{
    Capability, CloudProvider, ConnectionStatus, CreateRequest, DestroyOutcome, Inventory,
    ResourceGroupInfo, ResourceInfo,
};
pub use registry::{PreferredProviders, ProviderRegistry, Requirements};
pub use resource::{ProvisionedResource, ResourceKind};
