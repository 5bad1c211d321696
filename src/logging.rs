//! Tracing initialization for the binary
//!
//! Logs go to stderr so stdout stays reserved for the accounts CSV.

use tracing_subscriber::EnvFilter;

/// Initialize tracing for the process
///
/// `RUST_LOG` takes precedence over `level`. Safe to call multiple times
/// (subsequent calls are no-ops).
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
