//! Logging setup.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise the crate named by `bin_name` and the
/// server library log at `default_level` and everything else at `warn`.
pub fn setup_logger(bin_name: &str, default_level: &str) {
    let crate_name = bin_name.replace('-', "_");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,{crate_name}={default_level},parlor_server={default_level},tower_http={default_level}"
        ))
    });

    // `try_init` so repeated calls (e.g. from tests) are harmless
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_ansi(true))
        .with(filter)
        .try_init();
}
