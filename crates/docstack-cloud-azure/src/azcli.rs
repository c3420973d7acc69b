//! az CLI wrapper
//!
//! Wraps the `az` CLI commands used for Azure operations. Output parsing
//! tolerates warning preambles the CLI sometimes prints before its JSON.

use crate::error::{AzureError, Result};
use docstack_cloud::{CommandRunner, extract_json};
use serde::Deserialize;
use std::sync::Arc;

pub const STORAGE_ACCOUNT_TYPE: &str = "Microsoft.Storage/storageAccounts";
pub const CONTAINER_TYPE: &str = "Microsoft.Storage/containers";
pub const FORM_RECOGNIZER_TYPE: &str = "Microsoft.CognitiveServices/accounts";
pub const SEARCH_SERVICE_TYPE: &str = "Microsoft.Search/searchServices";

/// az CLI wrapper
pub struct AzCli {
    runner: Arc<dyn CommandRunner>,
}

impl AzCli {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Run an az command and return raw output on success.
    ///
    /// Non-zero exit carries the combined stdout/stderr so operators see
    /// the full tool diagnostics.
    async fn run_az_raw(&self, args: &[&str]) -> Result<String> {
        let output = self.runner.run("az", args).await?;

        if !output.success() {
            return Err(AzureError::CommandFailed(format!(
                "az {}: {}",
                args.first().copied().unwrap_or(""),
                output.combined()
            )));
        }

        Ok(output.stdout)
    }

    /// Run an az command and parse its JSON output
    async fn run_az_json(&self, args: &[&str]) -> Result<serde_json::Value> {
        let stdout = self.run_az_raw(args).await?;
        Ok(extract_json(&stdout)?)
    }

    /// Currently logged-in account (`az account show`)
    pub async fn account_show(&self) -> Result<AzAccount> {
        let output = self.runner.run("az", &["account", "show", "--output", "json"]).await?;

        if !output.success() {
            return Err(AzureError::NotAuthenticated);
        }

        let value = extract_json(&output.stdout)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Names of all resource groups
    pub async fn group_list(&self) -> Result<Vec<String>> {
        let value = self
            .run_az_json(&["group", "list", "--query", "[].name", "--output", "json"])
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Resource group metadata; errors when the group does not exist
    pub async fn group_show(&self, name: &str) -> Result<AzGroup> {
        let value = self
            .run_az_json(&["group", "show", "--name", name, "--output", "json"])
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Whether a resource group exists (`az group exists` prints a bare
    /// true/false, not JSON)
    pub async fn group_exists(&self, name: &str) -> Result<bool> {
        let stdout = self.run_az_raw(&["group", "exists", "--name", name]).await?;
        Ok(stdout.trim().eq_ignore_ascii_case("true"))
    }

    /// Create a resource group
    pub async fn group_create(&self, name: &str, location: &str) -> Result<AzGroup> {
        let value = self
            .run_az_json(&[
                "group", "create", "--name", name, "--location", location, "--output", "json",
            ])
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Delete a resource group without waiting for completion. Deletes all
    /// resources inside the group.
    pub async fn group_delete_no_wait(&self, name: &str) -> Result<()> {
        self.run_az_raw(&["group", "delete", "--name", name, "--yes", "--no-wait"])
            .await?;
        Ok(())
    }

    /// Top-level resources in a resource group
    pub async fn resource_list(&self, resource_group: &str) -> Result<Vec<AzResource>> {
        let value = self
            .run_az_json(&[
                "resource", "list", "--resource-group", resource_group, "--output", "json",
            ])
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Create a storage account (Standard_LRS, StorageV2)
    pub async fn storage_account_create(
        &self,
        name: &str,
        resource_group: &str,
        location: &str,
    ) -> Result<serde_json::Value> {
        self.run_az_json(&[
            "storage", "account", "create",
            "--name", name,
            "--resource-group", resource_group,
            "--location", location,
            "--sku", "Standard_LRS",
            "--kind", "StorageV2",
            "--output", "json",
        ])
        .await
    }

    /// Access keys of a storage account
    pub async fn storage_keys_list(
        &self,
        account: &str,
        resource_group: &str,
    ) -> Result<Vec<StorageKey>> {
        let value = self
            .run_az_json(&[
                "storage", "account", "keys", "list",
                "--account-name", account,
                "--resource-group", resource_group,
                "--output", "json",
            ])
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Create a blob container using an account key
    pub async fn storage_container_create(
        &self,
        name: &str,
        account: &str,
        account_key: &str,
    ) -> Result<serde_json::Value> {
        self.run_az_json(&[
            "storage", "container", "create",
            "--name", name,
            "--account-name", account,
            "--account-key", account_key,
            "--output", "json",
        ])
        .await
    }

    /// Container names inside a storage account, via login auth
    pub async fn storage_container_list(&self, account: &str) -> Result<Vec<String>> {
        let value = self
            .run_az_json(&[
                "storage", "container", "list",
                "--account-name", account,
                "--auth-mode", "login",
                "--query", "[].name",
                "--output", "json",
            ])
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Create a Form Recognizer cognitive services account (S0)
    pub async fn cognitive_account_create(
        &self,
        name: &str,
        resource_group: &str,
        location: &str,
    ) -> Result<serde_json::Value> {
        self.run_az_json(&[
            "cognitiveservices", "account", "create",
            "--name", name,
            "--resource-group", resource_group,
            "--location", location,
            "--kind", "FormRecognizer",
            "--sku", "S0",
            "--yes",
            "--output", "json",
        ])
        .await
    }

    /// Access keys of a cognitive services account
    pub async fn cognitive_keys_list(
        &self,
        name: &str,
        resource_group: &str,
    ) -> Result<CognitiveKeys> {
        let value = self
            .run_az_json(&[
                "cognitiveservices", "account", "keys", "list",
                "--name", name,
                "--resource-group", resource_group,
                "--output", "json",
            ])
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Create an AI Search service (basic sku)
    pub async fn search_service_create(
        &self,
        name: &str,
        resource_group: &str,
        location: &str,
    ) -> Result<serde_json::Value> {
        self.run_az_json(&[
            "search", "service", "create",
            "--name", name,
            "--resource-group", resource_group,
            "--location", location,
            "--sku", "basic",
            "--output", "json",
        ])
        .await
    }
}

/// Account info from `az account show`
#[derive(Debug, Clone, Deserialize)]
pub struct AzAccount {
    pub name: String,
    pub id: String,
}

impl AzAccount {
    /// Subscription id truncated for display; never expose the full id
    pub fn truncated_id(&self) -> String {
        let prefix: String = self.id.chars().take(8).collect();
        format!("{prefix}...")
    }
}

/// Resource group info from `az group show` / `az group create`
#[derive(Debug, Clone, Deserialize)]
pub struct AzGroup {
    #[serde(default)]
    pub name: Option<String>,
    pub location: String,
    #[serde(default)]
    pub id: Option<String>,
}

/// Access key entry from `az storage account keys list`
#[derive(Debug, Clone, Deserialize)]
pub struct StorageKey {
    pub value: String,
}

/// Access keys from `az cognitiveservices account keys list`
#[derive(Debug, Clone, Deserialize)]
pub struct CognitiveKeys {
    pub key1: String,
    #[serde(default)]
    pub key2: Option<String>,
}

/// Resource info from `az resource list`
#[derive(Debug, Clone, Deserialize)]
pub struct AzResource {
    pub name: String,

    #[serde(rename = "type")]
    pub resource_type: String,

    #[serde(default)]
    pub location: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncated_id() {
        let account = AzAccount {
            name: "Pay-As-You-Go".to_string(),
            id: "12345678-abcd-ef01-2345-67890abcdef0".to_string(),
        };
        assert_eq!(account.truncated_id(), "12345678...");
    }

    #[test]
    fn test_az_resource_type_field() {
        let resource: AzResource = serde_json::from_str(
            r#"{"name": "stor1", "type": "Microsoft.Storage/storageAccounts", "location": "eastasia"}"#,
        )
        .unwrap();
        assert_eq!(resource.resource_type, STORAGE_ACCOUNT_TYPE);
    }
}
