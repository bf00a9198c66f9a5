//! Local transport
//!
//! Runs the rendered script on the current host, for when the provisioning
//! process already lives on the database server.

use anyhow::Result;
use async_trait::async_trait;
use common::{run, CommandOutput};
use tracing::debug;

use super::{render_script, Executor, RemoteCommand};

/// Runs commands directly on the current host.
#[derive(Debug, Default)]
pub struct LocalExecutor;

impl LocalExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Executor for LocalExecutor {
    async fn run(&self, cmd: &RemoteCommand) -> Result<CommandOutput> {
        let script = render_script(cmd);
        debug!(line = %cmd.line, "Running locally");
        run("sh", &["-c", &script]).await
    }
}
