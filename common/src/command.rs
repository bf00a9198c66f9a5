//! Command execution utilities
//!
//! Provides consistent subprocess execution with captured output and logging.

use anyhow::{anyhow, Context, Result};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Captured result of a finished command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub code: Option<i32>,
}

impl CommandOutput {
    /// Convert into stdout, treating non-zero exit as an error.
    ///
    /// `what` names the command in the error message.
    pub fn require_success(self, what: &str) -> Result<String> {
        if self.success {
            Ok(self.stdout)
        } else {
            let code = self
                .code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            Err(anyhow!("{} failed (exit {}): {}", what, code, self.stderr))
        }
    }
}

/// Run a command and return its captured output.
///
/// Non-zero exit is NOT an error here; check `success` yourself, or call
/// `require_success` to treat it as one.
#[instrument(skip_all, fields(cmd = %cmd))]
pub async fn run(cmd: &str, args: &[&str]) -> Result<CommandOutput> {
    debug!(args = ?args, "Running command");

    let output = Command::new(cmd)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .context(format!("Failed to execute {}", cmd))?;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        success: output.status.success(),
        code: output.status.code(),
    })
}
