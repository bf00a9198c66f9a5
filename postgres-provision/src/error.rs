//! Typed errors for provisioning operations

use thiserror::Error;

/// A database setting that cannot change after creation differs from the
/// requested value.
///
/// Raised by database update under [`MismatchPolicy::Fail`]; downgraded to
/// a warning under [`MismatchPolicy::Warn`].
///
/// [`MismatchPolicy::Fail`]: crate::admin::MismatchPolicy::Fail
/// [`MismatchPolicy::Warn`]: crate::admin::MismatchPolicy::Warn
#[derive(Debug, Error)]
#[error("database {database} has {setting} '{actual}' but '{requested}' was requested; it cannot change after creation")]
pub struct SettingMismatch {
    pub database: String,
    pub setting: &'static str,
    pub actual: String,
    pub requested: String,
}
