//! PostgreSQL administration operations
//!
//! [`PostgresAdmin`] bundles the provisioning operations over an
//! [`Executor`]. Every remote action runs as the configured superuser
//! account from the filesystem root; psql otherwise warns that it could not
//! change into the invoking user's home directory, which the superuser
//! account usually cannot read.

mod database;
mod role;

pub use database::{DatabaseOptions, MismatchPolicy};
pub use role::RoleOptions;

use std::sync::Arc;

use anyhow::Result;
use common::CommandOutput;
use tracing::debug;

use crate::exec::{Executor, RemoteCommand};

/// System account the postgres tools run as by default.
pub const DEFAULT_SUPERUSER: &str = "postgres";

/// Provisioning operations against a single PostgreSQL host.
///
/// The executor is a required constructor argument: without a working
/// transport there is no admin to construct, so capability checks happen
/// once at startup instead of on every call.
pub struct PostgresAdmin {
    executor: Arc<dyn Executor>,
    superuser: String,
}

impl PostgresAdmin {
    /// Create an admin over the given executor, running as `postgres`.
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self {
            executor,
            superuser: DEFAULT_SUPERUSER.to_string(),
        }
    }

    /// Use a different superuser account than `postgres`.
    pub fn with_superuser(mut self, superuser: impl Into<String>) -> Self {
        self.superuser = superuser.into();
        self
    }

    pub fn superuser(&self) -> &str {
        &self.superuser
    }

    fn privileged(&self, line: String) -> RemoteCommand {
        RemoteCommand::new(line)
            .as_user(self.superuser.as_str())
            .current_dir("/")
    }

    /// Run a command as the superuser; non-zero exit is an error carrying
    /// the captured stderr. Never retried.
    pub(crate) async fn run_as_superuser(&self, line: &str) -> Result<String> {
        debug!(%line, "Running privileged command");
        self.executor
            .run(&self.privileged(line.to_string()))
            .await?
            .require_success(line)
    }

    /// Run a read-only probe as the superuser; non-zero exit is tolerated
    /// and reported through the returned output.
    pub(crate) async fn probe_as_superuser(&self, line: &str) -> Result<CommandOutput> {
        debug!(%line, "Probing");
        self.executor.run(&self.privileged(line.to_string())).await
    }

    /// Probe the system catalog; true when the query ran and returned
    /// exactly one row.
    pub(crate) async fn catalog_has(&self, sql: &str) -> Result<bool> {
        let out = self
            .probe_as_superuser(&format!(r#"psql -tAc "{}""#, sql))
            .await?;
        Ok(out.success && out.stdout == "1")
    }
}
