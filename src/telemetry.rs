//! Tracing bootstrap for binaries, demos and tests.

use tracing_subscriber::EnvFilter;

/// Installs a global fmt subscriber honoring `RUST_LOG`, defaulting to
/// `colweave=info`. Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("colweave=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
