//! Configuration for docstack
//!
//! One [`AppConfig`] is built from the environment at process start and
//! passed by reference into the provider registry and the engines. Deep
//! call paths never read the environment themselves.

pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Deployment environment; drives the env-code in generated resource names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Short code used inside generated resource names
    pub fn code(&self) -> &'static str {
        match self {
            Environment::Development => "dev",
            Environment::Production => "prd",
        }
    }
}

/// Preferred provider identifier per capability axis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderPreferences {
    pub storage: String,
    pub decomposer: String,
    pub embedder: String,
    pub indexer: String,
    pub cloud: String,
}

impl Default for ProviderPreferences {
    fn default() -> Self {
        Self {
            storage: "azure".to_string(),
            decomposer: "local".to_string(),
            embedder: "openai".to_string(),
            indexer: "local".to_string(),
            cloud: "azure".to_string(),
        }
    }
}

/// Azure credentials and per-installation settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AzureConfig {
    pub subscription_id: Option<String>,
    pub tenant_id: Option<String>,
    /// Case-insensitive substring filter for inventory queries
    pub resource_group_prefix: Option<String>,
    /// Blob container holding uploaded documents
    pub storage_container: String,
}

/// Connection settings for the relational store backing the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// `postgresql` or `mysql2`; anything else cannot be backed up
    pub adapter: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            adapter: "postgresql".to_string(),
            host: None,
            port: None,
            username: None,
            password: None,
            database: "docstack".to_string(),
        }
    }
}

/// Process-wide configuration, built once at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub preferred: ProviderPreferences,
    pub azure: AzureConfig,
    pub database: DatabaseConfig,
    /// Short organization tag prefixed onto generated resource names
    pub org_tag: String,
    pub environment: Environment,
    /// Directory backups are written into
    pub backup_dir: PathBuf,
}

impl AppConfig {
    /// Read configuration from the environment.
    ///
    /// Missing variables fall back to defaults; only malformed values
    /// (e.g. a non-numeric port) error out.
    pub fn from_env() -> Result<Self> {
        let environment = match env_opt("APP_ENV").as_deref() {
            Some("production") => Environment::Production,
            _ => Environment::Development,
        };

        let port = match env_opt("DATABASE_PORT") {
            Some(raw) => Some(raw.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                variable: "DATABASE_PORT".to_string(),
                value: raw,
            })?),
            None => None,
        };

        let defaults = ProviderPreferences::default();
        Ok(Self {
            preferred: ProviderPreferences {
                storage: env_or("PREFERRED_STORAGE_PROVIDER", &defaults.storage),
                decomposer: env_or("PREFERRED_DECOMPOSER_PROVIDER", &defaults.decomposer),
                embedder: env_or("PREFERRED_EMBEDDER_PROVIDER", &defaults.embedder),
                indexer: env_or("PREFERRED_INDEXER_PROVIDER", &defaults.indexer),
                cloud: env_or("PREFERRED_CLOUD_PROVIDER", &defaults.cloud),
            },
            azure: AzureConfig {
                subscription_id: env_opt("AZURE_SUBSCRIPTION_ID"),
                tenant_id: env_opt("AZURE_TENANT_ID"),
                resource_group_prefix: env_opt("AZURE_RESOURCE_GROUP_PREFIX"),
                storage_container: env_or("AZURE_STORAGE_CONTAINER", "documents"),
            },
            database: DatabaseConfig {
                adapter: env_or("DATABASE_ADAPTER", "postgresql"),
                host: env_opt("DATABASE_HOST"),
                port,
                username: env_opt("DATABASE_USER"),
                password: env_opt("DATABASE_PASSWORD"),
                database: env_or("DATABASE_NAME", "docstack"),
            },
            org_tag: env_or("ORG_TAG", "uts"),
            environment,
            backup_dir: PathBuf::from(env_or("BACKUP_DIR", "tmp/backups")),
        })
    }
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_or(name: &str, default: &str) -> String {
    env_opt(name).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        temp_env::with_vars_unset(
            [
                "APP_ENV",
                "PREFERRED_CLOUD_PROVIDER",
                "AZURE_SUBSCRIPTION_ID",
                "DATABASE_ADAPTER",
                "DATABASE_PORT",
            ],
            || {
                let config = AppConfig::from_env().unwrap();
                assert_eq!(config.environment, Environment::Development);
                assert_eq!(config.environment.code(), "dev");
                assert_eq!(config.preferred.cloud, "azure");
                assert_eq!(config.database.adapter, "postgresql");
                assert_eq!(config.azure.storage_container, "documents");
                assert!(config.azure.subscription_id.is_none());
            },
        );
    }

    #[test]
    fn test_env_overrides() {
        temp_env::with_vars(
            [
                ("APP_ENV", Some("production")),
                ("PREFERRED_CLOUD_PROVIDER", Some("aws")),
                ("AZURE_RESOURCE_GROUP_PREFIX", Some("uts")),
                ("DATABASE_PORT", Some("5433")),
            ],
            || {
                let config = AppConfig::from_env().unwrap();
                assert_eq!(config.environment, Environment::Production);
                assert_eq!(config.environment.code(), "prd");
                assert_eq!(config.preferred.cloud, "aws");
                assert_eq!(config.azure.resource_group_prefix.as_deref(), Some("uts"));
                assert_eq!(config.database.port, Some(5433));
            },
        );
    }

    #[test]
    fn test_invalid_port() {
        temp_env::with_var("DATABASE_PORT", Some("not-a-port"), || {
            let err = AppConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("DATABASE_PORT"));
        });
    }
}
