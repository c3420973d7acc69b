//! Per-provider configuration status summary

use docstack_config::AppConfig;
use serde::Serialize;
use std::collections::BTreeMap;

/// Whether a cloud provider is configured and usable in this installation
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    pub configured: bool,
    pub available: bool,

    /// Truncated, display-only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Status of every known cloud provider
pub fn provider_status(config: &AppConfig) -> BTreeMap<&'static str, ProviderStatus> {
    let mut statuses = BTreeMap::new();

    let azure_configured = config.azure.subscription_id.is_some();
    statuses.insert(
        "azure",
        ProviderStatus {
            configured: azure_configured,
            available: azure_configured,
            subscription_id: config
                .azure
                .subscription_id
                .as_ref()
                .map(|id| format!("{}...", id.chars().take(8).collect::<String>())),
            message: None,
        },
    );

    for name in ["aws", "gcp"] {
        statuses.insert(
            name,
            ProviderStatus {
                configured: false,
                available: false,
                subscription_id: None,
                message: Some(format!("{} deployment not yet implemented", name.to_uppercase())),
            },
        );
    }

    statuses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::test_config;

    #[test]
    fn test_azure_status_truncates_subscription() {
        let statuses = provider_status(&test_config());

        let azure = &statuses["azure"];
        assert!(azure.configured);
        assert_eq!(azure.subscription_id.as_deref(), Some("12345678..."));

        let aws = &statuses["aws"];
        assert!(!aws.configured);
        assert!(aws.message.as_deref().unwrap().contains("not yet implemented"));
    }

    #[test]
    fn test_azure_unconfigured_without_subscription() {
        let mut config = test_config();
        config.azure.subscription_id = None;

        let statuses = provider_status(&config);
        assert!(!statuses["azure"].configured);
        assert!(statuses["azure"].subscription_id.is_none());
    }
}
