//! Structured logging initialization
//!
//! Provides consistent logging initialization for consumers of the
//! provisioning library.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Guard that keeps the tracing subscriber active.
/// Drop this at the end of main to flush logs.
pub struct LogGuard;

/// Initialize structured logging.
///
/// Returns a guard that should be held for the lifetime of the program.
/// Safe to call more than once; later calls leave the first subscriber
/// in place (so tests can call it freely).
///
/// # Example
/// ```ignore
/// let _guard = init_logging("provisioner");
/// info!("Starting up...");
/// ```
pub fn init_logging(_component: &str) -> LogGuard {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let format = fmt::layer().with_target(false);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .try_init();

    LogGuard
}
