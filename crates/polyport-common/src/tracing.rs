//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// Filtering is controlled by `RUST_LOG`; `default_directive` applies when
/// the variable is unset. Calling this twice is a no-op (the second install
/// fails silently), which keeps tests that share a process happy.
pub fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .ok();
}
