//! Role provisioning operations

use anyhow::{anyhow, Result};
use tracing::{debug, info};

use super::PostgresAdmin;

/// Attributes for creating or updating a role.
///
/// Capability flags are tri-state: `None` leaves the capability unchanged
/// on update and falls back to the create default on create (inherit and
/// login on, the rest off).
#[derive(Debug, Clone, Default)]
pub struct RoleOptions {
    pub password: Option<String>,
    pub superuser: Option<bool>,
    pub createdb: Option<bool>,
    pub createrole: Option<bool>,
    pub inherit: Option<bool>,
    pub login: Option<bool>,
}

impl RoleOptions {
    fn flags(&self) -> [(Option<bool>, &'static str, &'static str); 5] {
        [
            (self.superuser, "SUPERUSER", "NOSUPERUSER"),
            (self.createdb, "CREATEDB", "NOCREATEDB"),
            (self.createrole, "CREATEROLE", "NOCREATEROLE"),
            (self.inherit, "INHERIT", "NOINHERIT"),
            (self.login, "LOGIN", "NOLOGIN"),
        ]
    }

    /// All five capability keywords, unset flags resolved to the create
    /// defaults. CREATE ROLE never omits a capability.
    fn create_keywords(&self) -> Vec<&'static str> {
        const DEFAULTS: [bool; 5] = [false, false, false, true, true];
        self.flags()
            .into_iter()
            .zip(DEFAULTS)
            .map(|((flag, on, off), default)| if flag.unwrap_or(default) { on } else { off })
            .collect()
    }

    /// Only the explicitly-set capability keywords, for ALTER ROLE.
    fn set_keywords(&self) -> Vec<&'static str> {
        self.flags()
            .into_iter()
            .filter_map(|(flag, on, off)| flag.map(|v| if v { on } else { off }))
            .collect()
    }
}

impl PostgresAdmin {
    /// Check whether a role exists.
    pub async fn role_exists(&self, name: &str) -> Result<bool> {
        self.catalog_has(&format!(
            "SELECT 1 FROM pg_roles WHERE rolname = '{}'",
            name
        ))
        .await
    }

    /// Create a role, spelling out all five capability keywords.
    pub async fn role_create(
        &self,
        name: &str,
        password: &str,
        options: &RoleOptions,
    ) -> Result<()> {
        let sql = format!(
            "CREATE ROLE {} WITH {} PASSWORD '{}'",
            name,
            options.create_keywords().join(" "),
            password,
        );
        self.run_as_superuser(&format!(r#"psql -U {} -c "{}""#, self.superuser, sql))
            .await?;
        Ok(())
    }

    /// Rewrite the explicitly-set attributes of an existing role.
    ///
    /// Unset attributes are omitted from the statement and stay unchanged
    /// server-side; set attributes are rewritten even when the value
    /// already matches. With nothing set at all the call is a no-op, since
    /// `ALTER ROLE ... WITH` requires at least one clause.
    pub async fn role_update(&self, name: &str, options: &RoleOptions) -> Result<()> {
        let mut clauses: Vec<String> = options
            .set_keywords()
            .into_iter()
            .map(str::to_string)
            .collect();
        if let Some(password) = &options.password {
            clauses.push(format!("PASSWORD '{}'", password));
        }
        if clauses.is_empty() {
            debug!(role = %name, "No attributes to update");
            return Ok(());
        }
        let sql = format!("ALTER ROLE {} WITH {}", name, clauses.join(" "));
        self.run_as_superuser(&format!(r#"psql -c "{}""#, sql))
            .await?;
        Ok(())
    }

    /// Create the role if absent, update it otherwise.
    ///
    /// The create branch requires a password, since CREATE ROLE always
    /// carries a PASSWORD clause here. Check-then-act: see
    /// [`PostgresAdmin::database_ensure`] for the race caveat.
    pub async fn role_ensure(&self, name: &str, options: &RoleOptions) -> Result<()> {
        if self.role_exists(name).await? {
            info!(role = %name, "Role exists, updating");
            self.role_update(name, options).await
        } else {
            info!(role = %name, "Role does not exist, creating");
            let password = options
                .password
                .as_deref()
                .ok_or_else(|| anyhow!("creating role {} requires a password", name))?;
            self.role_create(name, password, options).await
        }
    }
}
