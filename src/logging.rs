//! Logging initialisation.
//!
//! The library only emits `tracing` events; binaries and tests decide
//! where they go by calling one of these helpers.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs a formatting subscriber driven by `RUST_LOG`.
///
/// # Environment
/// - `RUST_LOG`: filter directives (default: `info`), e.g.
///   `RUST_LOG=recipe_schedule=debug`
///
/// # Example
/// ```no_run
/// recipe_schedule::logging::init();
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();
}

/// Installs a debug-level subscriber writing to the test harness.
///
/// Safe to call from many tests; only the first call installs.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
