//! Diagnostic logging via tracing.
//!
//! User-facing progress goes through `styling`; this subscriber carries the
//! structured diagnostics (fold timings, imputation fills, convergence
//! warnings) to stderr. `RUST_LOG` overrides the default filter.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber. Subsequent calls are no-ops.
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose { "churnlab=debug" } else { "churnlab=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}
