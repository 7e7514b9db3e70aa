//! Logging initialization.

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set. Otherwise the filter is `info`, raised to
/// `info,reelsmith=debug` when `verbose` is true.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let fallback = if verbose { "info,reelsmith=debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .try_init()
}
