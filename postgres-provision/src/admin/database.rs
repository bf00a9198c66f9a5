//! Database provisioning operations

use anyhow::{bail, Result};
use tracing::{info, warn};

use crate::error::SettingMismatch;

use super::PostgresAdmin;

/// Optional attributes for creating or updating a database.
///
/// On create, each set field becomes a `createdb` flag. On update,
/// tablespace and owner are applied while locale and encoding are only
/// verified, since PostgreSQL fixes them at creation time.
#[derive(Debug, Clone, Default)]
pub struct DatabaseOptions {
    pub tablespace: Option<String>,
    pub locale: Option<String>,
    pub encoding: Option<String>,
    pub owner: Option<String>,
    pub template: Option<String>,
}

/// What to do when an immutable database setting does not match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MismatchPolicy {
    /// Raise a [`SettingMismatch`] error.
    #[default]
    Fail,
    /// Log a warning and continue.
    Warn,
}

impl PostgresAdmin {
    /// Check whether a database exists.
    pub async fn database_exists(&self, name: &str) -> Result<bool> {
        self.catalog_has(&format!(
            "SELECT 1 FROM pg_database WHERE datname = '{}'",
            name
        ))
        .await
    }

    /// Create a database via `createdb`, one flag per set option.
    pub async fn database_create(&self, name: &str, options: &DatabaseOptions) -> Result<()> {
        let mut cmd = format!("createdb -U {}", self.superuser);
        for (flag, value) in [
            ("--tablespace", &options.tablespace),
            ("--locale", &options.locale),
            ("--encoding", &options.encoding),
            ("--owner", &options.owner),
            ("--template", &options.template),
        ] {
            if let Some(value) = value {
                cmd.push_str(&format!(" {}={}", flag, value));
            }
        }
        cmd.push_str(&format!(" {}", name));
        self.run_as_superuser(&cmd).await?;
        Ok(())
    }

    /// Update an existing database.
    ///
    /// Tablespace and owner are rewritten unconditionally when set, even if
    /// the value already matches. Locale and encoding cannot change after
    /// creation; when set they are compared against the live value and a
    /// mismatch is handled per `policy`. Under [`MismatchPolicy::Fail`] the
    /// first mismatch aborts the call; changes already applied stay applied.
    pub async fn database_update(
        &self,
        name: &str,
        options: &DatabaseOptions,
        policy: MismatchPolicy,
    ) -> Result<()> {
        if let Some(tablespace) = &options.tablespace {
            self.run_as_superuser(&format!(
                r#"psql -tAc "ALTER DATABASE {} SET TABLESPACE {}""#,
                name, tablespace
            ))
            .await?;
        }
        if let Some(owner) = &options.owner {
            self.run_as_superuser(&format!(
                r#"psql -tAc "ALTER DATABASE {} OWNER TO {}""#,
                name, owner
            ))
            .await?;
        }
        if let Some(locale) = &options.locale {
            self.verify_setting(name, "lc_collate", locale, policy)
                .await?;
        }
        if let Some(encoding) = &options.encoding {
            self.verify_setting(name, "server_encoding", encoding, policy)
                .await?;
        }
        Ok(())
    }

    async fn verify_setting(
        &self,
        name: &str,
        setting: &'static str,
        requested: &str,
        policy: MismatchPolicy,
    ) -> Result<()> {
        let out = self
            .probe_as_superuser(&format!(r#"psql -d {} -tAc "SHOW {}""#, name, setting))
            .await?;
        if !out.success {
            bail!(
                "failed to read {} of database {}: {}",
                setting,
                name,
                out.stderr
            );
        }
        let actual = out.stdout;
        if actual != requested {
            match policy {
                MismatchPolicy::Warn => {
                    warn!(
                        database = %name,
                        setting,
                        %actual,
                        %requested,
                        "Immutable setting differs, leaving as is"
                    );
                }
                MismatchPolicy::Fail => {
                    return Err(SettingMismatch {
                        database: name.to_string(),
                        setting,
                        actual,
                        requested: requested.to_string(),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Create the database if absent, update it otherwise.
    ///
    /// Check-then-act: not safe against a concurrent caller targeting the
    /// same name. The loser of the race fails at the remote command level.
    pub async fn database_ensure(
        &self,
        name: &str,
        options: &DatabaseOptions,
        policy: MismatchPolicy,
    ) -> Result<()> {
        if self.database_exists(name).await? {
            info!(database = %name, "Database exists, updating");
            self.database_update(name, options, policy).await
        } else {
            info!(database = %name, "Database does not exist, creating");
            self.database_create(name, options).await
        }
    }

    /// Grant all privileges on a database to a role.
    pub async fn database_grant_all(&self, database: &str, role: &str) -> Result<()> {
        self.run_as_superuser(&format!(
            r#"psql -c "GRANT ALL PRIVILEGES ON DATABASE {} TO {}""#,
            database, role
        ))
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::testing::{failed, ok, ScriptedExecutor};
    use std::sync::Arc;

    fn admin(executor: &Arc<ScriptedExecutor>) -> PostgresAdmin {
        PostgresAdmin::new(executor.clone())
    }

    fn owner_only(owner: &str) -> DatabaseOptions {
        DatabaseOptions {
            owner: Some(owner.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn exists_requires_literal_one() {
        let exec = Arc::new(ScriptedExecutor::new(vec![ok("1")]));
        assert!(admin(&exec).database_exists("app_db").await.unwrap());
        assert_eq!(
            exec.lines(),
            vec![r#"psql -tAc "SELECT 1 FROM pg_database WHERE datname = 'app_db'""#.to_string()]
        );

        let exec = Arc::new(ScriptedExecutor::new(vec![ok("")]));
        assert!(!admin(&exec).database_exists("app_db").await.unwrap());
    }

    #[tokio::test]
    async fn exists_tolerates_probe_failure() {
        let exec = Arc::new(ScriptedExecutor::new(vec![failed("connection refused")]));
        assert!(!admin(&exec).database_exists("app_db").await.unwrap());
    }

    #[tokio::test]
    async fn commands_run_as_superuser_from_root() {
        let exec = Arc::new(ScriptedExecutor::new(vec![ok("1")]));
        admin(&exec).database_exists("app_db").await.unwrap();
        let calls = exec.calls();
        assert_eq!(calls[0].user.as_deref(), Some("postgres"));
        assert_eq!(calls[0].cwd.as_deref(), Some("/"));
    }

    #[tokio::test]
    async fn ensure_creates_with_only_set_flags() {
        let exec = Arc::new(ScriptedExecutor::new(vec![ok(""), ok("")]));
        admin(&exec)
            .database_ensure("app_db", &owner_only("app_user"), MismatchPolicy::Fail)
            .await
            .unwrap();
        let lines = exec.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "createdb -U postgres --owner=app_user app_db");
    }

    #[tokio::test]
    async fn create_orders_all_flags() {
        let exec = Arc::new(ScriptedExecutor::new(vec![ok("")]));
        let options = DatabaseOptions {
            tablespace: Some("fast".to_string()),
            locale: Some("en_US.UTF-8".to_string()),
            encoding: Some("UTF8".to_string()),
            owner: Some("app_user".to_string()),
            template: Some("template0".to_string()),
        };
        admin(&exec).database_create("app_db", &options).await.unwrap();
        assert_eq!(
            exec.lines(),
            vec![
                "createdb -U postgres --tablespace=fast --locale=en_US.UTF-8 \
                 --encoding=UTF8 --owner=app_user --template=template0 app_db"
                    .to_string()
            ]
        );
    }

    #[tokio::test]
    async fn ensure_updates_when_present() {
        let exec = Arc::new(ScriptedExecutor::new(vec![ok("1"), ok("")]));
        admin(&exec)
            .database_ensure("app_db", &owner_only("app_user"), MismatchPolicy::Fail)
            .await
            .unwrap();
        let lines = exec.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], r#"psql -tAc "ALTER DATABASE app_db OWNER TO app_user""#);
    }

    #[tokio::test]
    async fn sequential_ensure_is_idempotent() {
        let exec = Arc::new(ScriptedExecutor::new(vec![
            ok(""),  // exists? no
            ok(""),  // createdb
            ok("1"), // exists? yes
            ok(""),  // owner update
        ]));
        let admin = admin(&exec);
        let options = owner_only("app_user");
        admin
            .database_ensure("app_db", &options, MismatchPolicy::Fail)
            .await
            .unwrap();
        admin
            .database_ensure("app_db", &options, MismatchPolicy::Fail)
            .await
            .unwrap();
        let lines = exec.lines();
        assert_eq!(lines.iter().filter(|l| l.starts_with("createdb")).count(), 1);
    }

    #[tokio::test]
    async fn locale_mismatch_fails_and_stops() {
        let exec = Arc::new(ScriptedExecutor::new(vec![
            ok(""),  // tablespace
            ok("C"), // SHOW lc_collate
        ]));
        let options = DatabaseOptions {
            tablespace: Some("fast".to_string()),
            locale: Some("en_US.UTF-8".to_string()),
            encoding: Some("UTF8".to_string()),
            ..Default::default()
        };
        let err = admin(&exec)
            .database_update("app_db", &options, MismatchPolicy::Fail)
            .await
            .unwrap_err();
        let mismatch = err.downcast_ref::<SettingMismatch>().unwrap();
        assert_eq!(mismatch.setting, "lc_collate");
        assert_eq!(mismatch.actual, "C");

        // encoding was never probed after the failure
        assert_eq!(exec.lines().len(), 2);
    }

    #[tokio::test]
    async fn locale_mismatch_warns_and_continues() {
        let exec = Arc::new(ScriptedExecutor::new(vec![
            ok("C"),    // SHOW lc_collate: differs
            ok("UTF8"), // SHOW server_encoding: matches
        ]));
        let options = DatabaseOptions {
            locale: Some("en_US.UTF-8".to_string()),
            encoding: Some("UTF8".to_string()),
            ..Default::default()
        };
        admin(&exec)
            .database_update("app_db", &options, MismatchPolicy::Warn)
            .await
            .unwrap();
        assert_eq!(exec.lines().len(), 2);
    }

    #[tokio::test]
    async fn grant_all_issues_single_statement() {
        let exec = Arc::new(ScriptedExecutor::new(vec![ok("GRANT")]));
        admin(&exec)
            .database_grant_all("app_db", "app_user")
            .await
            .unwrap();
        assert_eq!(
            exec.lines(),
            vec![r#"psql -c "GRANT ALL PRIVILEGES ON DATABASE app_db TO app_user""#.to_string()]
        );
    }

    #[tokio::test]
    async fn create_failure_propagates_stderr() {
        let exec = Arc::new(ScriptedExecutor::new(vec![failed("permission denied")]));
        let err = admin(&exec)
            .database_create("app_db", &DatabaseOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("permission denied"));
    }
}
