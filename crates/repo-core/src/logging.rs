//! Tracing setup for hosts embedding the engine

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::EngineConfig;
use crate::{Error, Result};

/// Engine crates at info, everything else at warn
pub const DEFAULT_DIRECTIVES: &str = "warn,repo_core=info,repo_store=info";

const TEST_DIRECTIVES: &str = "warn,repo_core=debug,repo_store=debug";

/// Filter from `RUST_LOG`, falling back to `directives`.
fn filter(directives: &str) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directives))
        .map_err(|e| Error::Logging {
            message: format!("invalid filter {directives:?}: {e}"),
        })
}

/// Install the global subscriber for an engine host.
///
/// Lines are compact and tagged with the thread name, so run loop output
/// shows up as `<scheme>-loop`. The filter comes from `RUST_LOG`, then the
/// configured `log_filter`, then [`DEFAULT_DIRECTIVES`].
///
/// # Errors
///
/// Returns `Logging` if the filter is invalid or a global subscriber is
/// already installed.
pub fn init(config: &EngineConfig) -> Result<()> {
    let directives = config.log_filter.as_deref().unwrap_or(DEFAULT_DIRECTIVES);
    let fmt_layer = fmt::layer().with_thread_names(true).compact();

    tracing_subscriber::registry()
        .with(filter(directives)?)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| Error::Logging {
            message: e.to_string(),
        })
}

/// Route engine logs through the test harness's output capture.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_for_tests() {
    let Ok(filter) = filter(TEST_DIRECTIVES) else {
        return;
    };
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_test_writer().with_thread_names(true).compact())
        .try_init();
}
