//! Logging setup
//!
//! Initializes the tracing subscriber with an env-filter. Safe to call
//! more than once; later calls are ignored.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging for the application or tests.
///
/// Honors `RUST_LOG`; defaults to debug for this crate and info for
/// everything else.
pub fn init() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tacknotes=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
