//! Tracing setup for the host process. Logs go to stderr; the host VM owns stdout.

use tracing_subscriber::EnvFilter;

/// Filter from RUST_LOG if set, else `default_level` (falls back to "warn" if unparsable).
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install a stderr fmt subscriber. Returns false if the host (or an earlier
/// call) already installed a global subscriber; that one is left in place.
pub fn init_tracing(default_level: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .try_init()
        .is_ok()
}
