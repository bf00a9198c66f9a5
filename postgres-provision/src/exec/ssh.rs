//! SSH transport
//!
//! Drives the system `ssh` client binary rather than speaking the protocol
//! in-process. Authentication is whatever the ambient ssh setup provides
//! (agent, identity file); BatchMode makes a missing key fail instead of
//! prompting.

use anyhow::Result;
use async_trait::async_trait;
use common::{run, CommandOutput, ConfigExt};
use std::env;
use tracing::debug;

use super::{render_script, Executor, RemoteCommand};

/// Connection settings for [`SshExecutor`].
#[derive(Debug, Clone)]
pub struct SshConfig {
    pub host: String,
    pub user: Option<String>,
    pub port: u16,
    pub identity_file: Option<String>,
    pub connect_timeout_secs: u64,
}

impl SshConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: None,
            port: 22,
            identity_file: None,
            connect_timeout_secs: 10,
        }
    }

    /// Load connection settings from `PGPROVISION_SSH_*` environment variables.
    ///
    /// `PGPROVISION_SSH_HOST` is required; user, port, identity file and
    /// connect timeout fall back to ssh defaults.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: String::env_required("PGPROVISION_SSH_HOST")?,
            user: env::var("PGPROVISION_SSH_USER").ok(),
            port: u16::env_parse("PGPROVISION_SSH_PORT", 22),
            identity_file: env::var("PGPROVISION_SSH_IDENTITY_FILE").ok(),
            connect_timeout_secs: u64::env_parse("PGPROVISION_SSH_CONNECT_TIMEOUT", 10),
        })
    }

    fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{}@{}", user, self.host),
            None => self.host.clone(),
        }
    }
}

/// Runs commands on the target host through the `ssh` client binary.
pub struct SshExecutor {
    config: SshConfig,
}

impl SshExecutor {
    pub fn new(config: SshConfig) -> Self {
        Self { config }
    }

    fn argv(&self, cmd: &RemoteCommand) -> Vec<String> {
        let mut argv = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.config.connect_timeout_secs),
            "-p".to_string(),
            self.config.port.to_string(),
        ];
        if let Some(identity) = &self.config.identity_file {
            argv.push("-i".to_string());
            argv.push(identity.clone());
        }
        argv.push(self.config.destination());
        argv.push(render_script(cmd));
        argv
    }
}

#[async_trait]
impl Executor for SshExecutor {
    async fn run(&self, cmd: &RemoteCommand) -> Result<CommandOutput> {
        let argv = self.argv(cmd);
        let args: Vec<&str> = argv.iter().map(String::as_str).collect();
        debug!(host = %self.config.host, line = %cmd.line, "Dispatching over ssh");
        run("ssh", &args).await
    }
}
