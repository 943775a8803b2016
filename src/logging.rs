//! Diagnostic logging setup.
//!
//! Report and prompt output go to stdout; diagnostics go to stderr through
//! `tracing`, filtered by `FOLDER_LINKS_LOG` (same syntax as `RUST_LOG`).

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "FOLDER_LINKS_LOG";

/// Filter used when `FOLDER_LINKS_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "folder_links=warn";

/// Installs the global subscriber. Later calls are ignored.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}
