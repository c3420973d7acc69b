//! Resource model for provisioned cloud infrastructure

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind of cloud resource managed by the provisioning engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Provider-side container grouping resources under one lifecycle
    ResourceGroup,
    /// Blob/object storage account
    StorageAccount,
    /// Container inside a storage account
    StorageContainer,
    /// Document intelligence (form recognition) service
    FormRecognizer,
    /// Search/indexing service
    SearchService,
}

impl ResourceKind {
    /// Stable identifier, also used as the progress-record status for the
    /// step that creates this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::ResourceGroup => "resource_group",
            ResourceKind::StorageAccount => "storage",
            ResourceKind::StorageContainer => "storage_container",
            ResourceKind::FormRecognizer => "form_recognizer",
            ResourceKind::SearchService => "search",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a deployment manifest.
///
/// Owned by the manifest that produced it; never mutated after creation,
/// only superseded by a later deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionedResource {
    /// Resource kind
    #[serde(rename = "type")]
    pub kind: ResourceKind,

    /// Resource name
    pub name: String,

    /// Region the resource lives in, where applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Service endpoint, where applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Provider-side resource ID, where applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Whether an already-provisioned resource was reused instead of created
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub existing: bool,

    /// Extra keys by resource type (account keys, parent names, ...)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, serde_json::Value>,
}

impl ProvisionedResource {
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            location: None,
            endpoint: None,
            id: None,
            existing: false,
            attributes: HashMap::new(),
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_existing(mut self, existing: bool) -> Self {
        self.existing = existing;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn get_attribute<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.attributes
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        let json = serde_json::to_string(&ResourceKind::FormRecognizer).unwrap();
        assert_eq!(json, "\"form_recognizer\"");
        assert_eq!(ResourceKind::StorageAccount.as_str(), "storage");
    }

    #[test]
    fn test_existing_omitted_when_false() {
        let fresh = ProvisionedResource::new(ResourceKind::ResourceGroup, "rg-test");
        let json = serde_json::to_value(&fresh).unwrap();
        assert!(json.get("existing").is_none());

        let reused = fresh.with_existing(true);
        let json = serde_json::to_value(&reused).unwrap();
        assert_eq!(json["existing"], true);
    }
}
