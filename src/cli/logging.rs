//! Tracing subscriber setup for the binary.

use std::io;

use diff_digest::DigestError;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding the log filter, e.g. `diff_digest=debug`.
pub const LOG_ENV_VAR: &str = "DIFF_DIGEST_LOG";

/// Installs a stderr subscriber filtered by [`LOG_ENV_VAR`], defaulting to
/// warnings.
///
/// # Errors
///
/// Returns [`DigestError::Configuration`] if a global subscriber is already
/// installed.
pub fn init() -> Result<(), DigestError> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .with_env_var(LOG_ENV_VAR)
        .from_env_lossy();

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_writer(io::stderr);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .try_init()
        .map_err(|error| DigestError::Configuration {
            message: format!("failed to install log subscriber: {error}"),
        })
}
