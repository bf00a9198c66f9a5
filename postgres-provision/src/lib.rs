//! Remote provisioning helpers for PostgreSQL databases and roles
//!
//! Shells out to `psql`/`createdb` on a target host, running them as the
//! `postgres` system user through a pluggable [`Executor`] (ssh or local).
//! The entry points are the `ensure` operations on [`PostgresAdmin`]:
//! check existence, then create or update, idempotent for sequential
//! callers.
//!
//! Concurrent callers targeting the same database or role name are not
//! coordinated. The existence check and the following create/update are
//! separate remote commands, so the second of two racing creates fails at
//! the remote command level.

pub mod admin;
pub mod error;
pub mod exec;
pub mod manifest;

pub use admin::{DatabaseOptions, MismatchPolicy, PostgresAdmin, RoleOptions};
pub use error::SettingMismatch;
pub use exec::{Executor, LocalExecutor, RemoteCommand, SshConfig, SshExecutor};
pub use manifest::Manifest;
