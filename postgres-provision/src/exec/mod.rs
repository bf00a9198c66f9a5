//! Remote command execution seam
//!
//! Every provisioning operation is a single shell command run on the target
//! host, optionally as another system user and from a specific directory.
//! [`RemoteCommand`] captures that triple; an [`Executor`] carries it to a
//! host.
//!
//! `Err` from an executor means the command could not be run at all (spawn
//! or connection failure). A remote non-zero exit comes back as a normal
//! [`CommandOutput`] with `success == false`, so callers choose whether to
//! tolerate it.

use anyhow::Result;
use async_trait::async_trait;

pub use common::CommandOutput;

mod local;
mod ssh;

pub use local::LocalExecutor;
pub use ssh::{SshConfig, SshExecutor};

/// A shell command to run on the provisioning target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCommand {
    pub line: String,
    pub user: Option<String>,
    pub cwd: Option<String>,
}

impl RemoteCommand {
    pub fn new(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            user: None,
            cwd: None,
        }
    }

    /// Run the command as another system user, via sudo.
    pub fn as_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Change into the given directory before running.
    pub fn current_dir(mut self, dir: impl Into<String>) -> Self {
        self.cwd = Some(dir.into());
        self
    }
}

/// Executes commands on the provisioning target.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn run(&self, cmd: &RemoteCommand) -> Result<CommandOutput>;
}

/// Quote a string as a single shell word.
pub(crate) fn sh_quote(s: &str) -> String {
    let plain = !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b'/' | b'@' | b'=' | b':'));
    if plain {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}

/// Render a [`RemoteCommand`] into a single shell script, applying the
/// working directory and the sudo user switch.
pub(crate) fn render_script(cmd: &RemoteCommand) -> String {
    let body = match &cmd.cwd {
        Some(dir) => format!("cd {} && {}", sh_quote(dir), cmd.line),
        None => cmd.line.clone(),
    };
    match &cmd.user {
        Some(user) => format!("sudo -u {} sh -c {}", sh_quote(user), sh_quote(&body)),
        None => body,
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Test double: records every command it receives and replays canned
    /// outputs in order. Once the canned outputs run out it answers with
    /// empty success.
    pub struct ScriptedExecutor {
        outputs: Mutex<VecDeque<CommandOutput>>,
        calls: Mutex<Vec<RemoteCommand>>,
    }

    impl ScriptedExecutor {
        pub fn new(outputs: Vec<CommandOutput>) -> Self {
            Self {
                outputs: Mutex::new(outputs.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> Vec<RemoteCommand> {
            self.calls.lock().unwrap().clone()
        }

        pub fn lines(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|c| c.line.clone())
                .collect()
        }
    }

    pub fn ok(stdout: &str) -> CommandOutput {
        CommandOutput {
            stdout: stdout.to_string(),
            stderr: String::new(),
            success: true,
            code: Some(0),
        }
    }

    pub fn failed(stderr: &str) -> CommandOutput {
        CommandOutput {
            stdout: String::new(),
            stderr: stderr.to_string(),
            success: false,
            code: Some(1),
        }
    }

    #[async_trait]
    impl Executor for ScriptedExecutor {
        async fn run(&self, cmd: &RemoteCommand) -> Result<CommandOutput> {
            self.calls.lock().unwrap().push(cmd.clone());
            let out = self
                .outputs
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| ok(""));
            Ok(out)
        }
    }
}
