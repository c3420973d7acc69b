//! External command execution
//!
//! Cloud adapters and the backup service shell out to provider tooling
//! (`az`, `pg_dump`, ...). All of that goes through the [`CommandRunner`]
//! trait so the parsing-fragility concern stays isolated and unit-testable
//! with fake executors.

use crate::error::{CloudError, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

/// Captured output of one external command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// stdout followed by stderr, for diagnostic messages
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Executor abstraction over external CLI tools
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command with extra environment variables and capture its output.
    ///
    /// A non-zero exit is NOT an error at this level; callers inspect
    /// [`CommandOutput::success`]. Only spawn failures error out.
    async fn run_with_env(
        &self,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Result<CommandOutput>;

    /// Run a command without extra environment
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        self.run_with_env(program, args, &[]).await
    }
}

/// [`CommandRunner`] backed by real process execution
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run_with_env(
        &self,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Result<CommandOutput> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        for (key, value) in env {
            cmd.env(key, value);
        }
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("Running: {} {}", program, args.join(" "));

        let output = cmd.output().await?;

        Ok(CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Extract the JSON document from CLI output.
///
/// Provider CLIs sometimes print warnings before the JSON payload. Lines are
/// dropped until one starts with `{` or `[`; the remainder must parse.
pub fn extract_json(output: &str) -> Result<serde_json::Value> {
    let json_part: String = output
        .lines()
        .skip_while(|line| {
            let trimmed = line.trim_start();
            !trimmed.starts_with('{') && !trimmed.starts_with('[')
        })
        .collect::<Vec<_>>()
        .join("\n");

    if json_part.trim().is_empty() {
        return Err(CloudError::Deployment(format!(
            "No JSON found in command output: {}",
            truncate(output, 500)
        )));
    }

    serde_json::from_str(&json_part).map_err(|e| {
        CloudError::Deployment(format!(
            "Invalid JSON in command output: {} (output: {})",
            e,
            truncate(&json_part, 500)
        ))
    })
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
