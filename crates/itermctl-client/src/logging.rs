//! Process-wide tracing setup
//!
//! The library only emits `tracing` events. Applications that do not install
//! their own subscriber can call [`init`] to get formatted output filtered by
//! `ITERMCTL_LOG_LEVEL`.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the filter directive, e.g. `debug` or
/// `itermctl_client=trace`.
pub const LOG_LEVEL_ENV: &str = "ITERMCTL_LOG_LEVEL";

pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Install a formatting subscriber.
///
/// Returns `false` if a global subscriber was already set; calling this more
/// than once is harmless.
pub fn init() -> bool {
    let directive = directive(std::env::var(LOG_LEVEL_ENV).ok());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

fn directive(raw: Option<String>) -> String {
    match raw {
        Some(level) if !level.trim().is_empty() => level.trim().to_string(),
        _ => DEFAULT_LOG_LEVEL.to_string(),
    }
}
