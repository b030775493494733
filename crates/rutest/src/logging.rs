//! Diagnostic logging setup
//!
//! Logs go to stderr so they never interleave with the case protocol on stdout.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding an `EnvFilter` directive
pub const LOG_ENV: &str = "RUTEST_LOG";

/// Install the global subscriber.
///
/// Priority: RUTEST_LOG env var > verbosity (1 = debug, 2+ = trace) > default (warn).
/// Later calls are no-ops.
pub fn init(verbosity: u8) {
    let filter = match EnvFilter::try_from_env(LOG_ENV) {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(default_directive(verbosity)),
    };

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init();
}

fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    }
}
