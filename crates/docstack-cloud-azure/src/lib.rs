//! Azure cloud provider for docstack
//!
//! Manages the Azure resources behind the document-processing pipeline:
//!
//! - Resource groups
//! - Storage accounts and their blob containers
//! - Cognitive Services (Form Recognizer)
//! - AI Search services
//!
//! All Azure interaction goes through the `az` CLI via the
//! [`docstack_cloud::CommandRunner`] abstraction, so every code path is
//! testable with a fake executor.

pub mod azcli;
pub mod error;
pub mod provider;

pub use azcli::AzCli;
pub use error::{AzureError, Result};
pub use provider::{AzureProvider, AzureSettings};
