//! Logging utilities for the todo service components.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize tracing with sensible defaults.
///
/// Uses the RUST_LOG environment variable to control log levels.
/// Default level is INFO.
pub fn init() {
    init_with_level("info", false);
}

/// Initialize tracing with JSON formatting (useful for structured logging).
pub fn init_json() {
    init_with_level("info", true);
}

/// Initialize tracing with an explicit fallback level.
///
/// RUST_LOG still wins when it is set.
pub fn init_with_level(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }
}
