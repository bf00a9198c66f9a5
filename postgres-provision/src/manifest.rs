//! Declarative provisioning manifests
//!
//! A manifest lists the roles and databases a host should end up with, in
//! YAML. Applying it walks the entries through the ensure operations:
//!
//! ```yaml
//! roles:
//!   - name: app_user
//!     password: secret
//!     createdb: true
//! databases:
//!   - name: app_db
//!     owner: app_user
//!     encoding: UTF8
//!     grant_all_to: [app_user]
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::admin::{DatabaseOptions, MismatchPolicy, PostgresAdmin, RoleOptions};

/// Desired roles and databases for one host.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub roles: Vec<RoleEntry>,
    #[serde(default)]
    pub databases: Vec<DatabaseEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleEntry {
    pub name: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub superuser: Option<bool>,
    #[serde(default)]
    pub createdb: Option<bool>,
    #[serde(default)]
    pub createrole: Option<bool>,
    #[serde(default)]
    pub inherit: Option<bool>,
    #[serde(default)]
    pub login: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseEntry {
    pub name: String,
    #[serde(default)]
    pub tablespace: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub template: Option<String>,
    /// Roles to receive `GRANT ALL PRIVILEGES` on this database.
    #[serde(default)]
    pub grant_all_to: Vec<String>,
}

impl RoleEntry {
    fn options(&self) -> RoleOptions {
        RoleOptions {
            password: self.password.clone(),
            superuser: self.superuser,
            createdb: self.createdb,
            createrole: self.createrole,
            inherit: self.inherit,
            login: self.login,
        }
    }
}

impl DatabaseEntry {
    fn options(&self) -> DatabaseOptions {
        DatabaseOptions {
            tablespace: self.tablespace.clone(),
            locale: self.locale.clone(),
            encoding: self.encoding.clone(),
            owner: self.owner.clone(),
            template: self.template.clone(),
        }
    }
}

impl Manifest {
    /// Parse a manifest from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse manifest")
    }

    /// Read and parse a manifest file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Ensure every role, then every database, then apply grants.
    ///
    /// Sequential and fail-fast: a failure stops the walk and leaves
    /// earlier entries applied.
    pub async fn apply(&self, admin: &PostgresAdmin, policy: MismatchPolicy) -> Result<()> {
        for role in &self.roles {
            admin
                .role_ensure(&role.name, &role.options())
                .await
                .with_context(|| format!("Failed to ensure role {}", role.name))?;
        }
        for database in &self.databases {
            admin
                .database_ensure(&database.name, &database.options(), policy)
                .await
                .with_context(|| format!("Failed to ensure database {}", database.name))?;
            for role in &database.grant_all_to {
                admin
                    .database_grant_all(&database.name, role)
                    .await
                    .with_context(|| {
                        format!("Failed to grant {} to {}", database.name, role)
                    })?;
            }
        }
        info!(
            roles = self.roles.len(),
            databases = self.databases.len(),
            "Manifest applied"
        );
        Ok(())
    }
}
