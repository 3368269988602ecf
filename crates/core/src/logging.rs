//! Logging initialization.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Filter used when neither `RUST_LOG` nor the config provides one.
pub const DEFAULT_LOG_FILTER: &str = "info,inflight=debug";

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` wins when set. Otherwise `fallback` is used, and if that does
/// not parse, [`DEFAULT_LOG_FILTER`].
///
/// # Example
/// ```
/// inflight_core::init_logging("info");
/// tracing::info!("Renderer initialized");
/// ```
pub fn init_logging(fallback: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    // A second init (tests, doc tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .try_init();
}
