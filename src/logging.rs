//! Logger setup for the command-line entry point.

use env_logger::{Builder, Env};

/// Default filter when `RUST_LOG` is unset.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

/// Install the global logger. `RUST_LOG` wins over `verbose`.
///
/// Safe to call more than once; later calls leave the first logger in place.
pub fn init(verbose: bool) {
    let _ = Builder::from_env(Env::default().default_filter_or(default_filter(verbose)))
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}
