//! Logging setup, on top of `tracing` and `tracing-subscriber`.
//!
//! `RUST_LOG` always wins. Without it, the level is `info`, or `debug`
//! when the run is configured with `display_log`.
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. Call once, from the binary.
///
/// ```no_run
/// prod_planning::logging::init(false);
/// ```
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();
}

/// Subscriber for tests, captured by the test harness. Safe to call from every test.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
