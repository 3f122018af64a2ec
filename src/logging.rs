//! Subscriber setup for the `vibecheck` binary.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the log filter, e.g. `debug` or `vibecheck=trace`.
pub const LOG_LEVEL_ENV_VAR: &str = "VIBE_LOG_LEVEL";

const DEFAULT_LOG_LEVEL: &str = "error";

/// Filter from `VIBE_LOG_LEVEL`, falling back to `error` when unset or invalid.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_LEVEL_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

/// Install a stderr fmt subscriber. Calling it twice is a no-op.
pub fn init_logging() {
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    // A subscriber may already be installed by the embedding application
    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(layer)
        .try_init();
}
