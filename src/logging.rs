//! Diagnostic logging.
//!
//! Logs go to stderr so they never mix with a script on stdout. `RUST_LOG`
//! wins when set; otherwise `--verbose` lowers the level from `warn` to `debug`.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn default_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "envprof=debug" } else { "envprof=warn" })
    })
}

/// Initialize logging, ignoring a subscriber that is already installed
pub fn init(verbose: bool) {
    let _ = tracing_subscriber::registry()
        .with(default_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .try_init();
}
