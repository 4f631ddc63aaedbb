//! Logging setup.
//!
//! Log lines go to stderr so command output on stdout stays pipeable.
//! `RUST_LOG` takes precedence over the configured level.

use std::io;

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Install the global tracing subscriber.
///
/// `verbose` raises the configured level to `debug`. Calling this twice is
/// harmless; the second call is ignored.
pub fn init_logging(config: &LoggingConfig, verbose: bool) {
    let default_level = if verbose {
        "debug"
    } else {
        config.level.as_str()
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false);

    let _ = if config.format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
