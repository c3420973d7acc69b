//! Provenance database backup
//!
//! Dumps the provenance tables (documents, document versions) before
//! infrastructure teardown. Derived data (chunks, embeddings, index
//! entries) is rebuildable and tied to the resources being destroyed, so
//! it is deliberately excluded.

use crate::error::{EngineError, Result};
use chrono::Utc;
use docstack_cloud::CommandRunner;
use docstack_config::DatabaseConfig;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Tables preserved across infrastructure teardown
pub const PROVENANCE_TABLES: &[&str] = &["documents", "document_versions"];

/// Result of one backup run
#[derive(Debug, Clone, Serialize)]
pub struct BackupRecord {
    pub backup_file: PathBuf,
    pub timestamp: String,
    pub size_bytes: u64,
    pub size_formatted: String,
}

/// Dumps provenance tables with the engine-native tool for the configured
/// database adapter
pub struct BackupService {
    runner: Arc<dyn CommandRunner>,
    database: DatabaseConfig,
    backup_dir: PathBuf,
}

impl BackupService {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        database: DatabaseConfig,
        backup_dir: impl AsRef<Path>,
    ) -> Self {
        Self {
            runner,
            database,
            backup_dir: backup_dir.as_ref().to_path_buf(),
        }
    }

    pub async fn run(&self) -> Result<BackupRecord> {
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
        tokio::fs::create_dir_all(&self.backup_dir).await?;
        let backup_file = self
            .backup_dir
            .join(format!("provenance_backup_{timestamp}.sql"));

        tracing::info!(
            "Creating provenance backup: {} (tables: {})",
            backup_file.display(),
            PROVENANCE_TABLES.join(", ")
        );

        let dump = match self.database.adapter.as_str() {
            "postgresql" => self.dump_postgresql().await?,
            "mysql2" => self.dump_mysql().await?,
            other => {
                return Err(EngineError::Backup(format!(
                    "Unsupported database adapter: {other}. Only PostgreSQL and MySQL are supported."
                )));
            }
        };

        tokio::fs::write(&backup_file, &dump).await?;

        let metadata = tokio::fs::metadata(&backup_file).await.map_err(|_| {
            EngineError::Backup(format!(
                "Backup file was not created: {}",
                backup_file.display()
            ))
        })?;

        let size_bytes = metadata.len();
        tracing::info!(
            "Backup created: {} ({})",
            backup_file.display(),
            format_bytes(size_bytes)
        );

        Ok(BackupRecord {
            backup_file,
            timestamp,
            size_bytes,
            size_formatted: format_bytes(size_bytes),
        })
    }

    async fn dump_postgresql(&self) -> Result<String> {
        let mut args: Vec<String> = Vec::new();
        if let Some(host) = &self.database.host {
            args.push("-h".to_string());
            args.push(host.clone());
        }
        if let Some(port) = self.database.port {
            args.push("-p".to_string());
            args.push(port.to_string());
        }
        if let Some(username) = &self.database.username {
            args.push("-U".to_string());
            args.push(username.clone());
        }
        for table in PROVENANCE_TABLES {
            args.push("-t".to_string());
            args.push(table.to_string());
        }
        args.push(self.database.database.clone());

        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let env: Vec<(&str, &str)> = match &self.database.password {
            Some(password) => vec![("PGPASSWORD", password.as_str())],
            None => Vec::new(),
        };

        let output = self
            .runner
            .run_with_env("pg_dump", &arg_refs, &env)
            .await
            .map_err(|e| EngineError::Backup(format!("pg_dump could not be run: {e}")))?;

        if !output.success() {
            return Err(EngineError::Backup(format!(
                "PostgreSQL backup failed: {}",
                output.combined()
            )));
        }
        Ok(output.stdout)
    }

    async fn dump_mysql(&self) -> Result<String> {
        let mut args: Vec<String> = Vec::new();
        if let Some(host) = &self.database.host {
            args.push("-h".to_string());
            args.push(host.clone());
        }
        if let Some(port) = self.database.port {
            args.push("-P".to_string());
            args.push(port.to_string());
        }
        if let Some(username) = &self.database.username {
            args.push("-u".to_string());
            args.push(username.clone());
        }
        if let Some(password) = &self.database.password {
            args.push(format!("-p{password}"));
        }
        args.push(self.database.database.clone());
        for table in PROVENANCE_TABLES {
            args.push(table.to_string());
        }

        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self
            .runner
            .run("mysqldump", &arg_refs)
            .await
            .map_err(|e| EngineError::Backup(format!("mysqldump could not be run: {e}")))?;

        if !output.success() {
            return Err(EngineError::Backup(format!(
                "MySQL backup failed: {}",
                output.combined()
            )));
        }
        Ok(output.stdout)
    }
}

/// Human-readable byte count
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let exp = ((bytes as f64).ln() / 1024_f64.ln()) as usize;
    let exp = exp.min(UNITS.len() - 1);

    format!("{:.2} {}", bytes as f64 / 1024_f64.powi(exp as i32), UNITS[exp])
}
