//! Diagnostic logging setup.
//!
//! Diagnostics go to stderr so they never mix with the analysed command's
//! output. The filter comes from the `SAFE_LOG` environment variable using
//! `EnvFilter` directive syntax, e.g. `SAFE_LOG=debug` or
//! `SAFE_LOG=safe_cli::exec=trace`. Without it only warnings and errors are
//! shown.

use std::io::{self, IsTerminal};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_ENV_VAR: &str = "SAFE_LOG";
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Build the level filter from `SAFE_LOG`, falling back to `warn`
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

/// Install the global subscriber
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_logging() {
    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(true);

    let installed = tracing_subscriber::registry()
        .with(env_filter())
        .with(stderr_layer)
        .try_init();

    if installed.is_ok() {
        tracing::debug!("logging initialized");
    }
}
