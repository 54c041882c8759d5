//! tracing subscriber setup.
//!
//! The engine itself only emits events; binaries call `init` once.

use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the configured filter
pub const LOG_ENV: &str = "GLIMPSE_LOG";

/// Install a fmt subscriber writing to stderr. Safe to call more than once;
/// later calls are ignored.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
