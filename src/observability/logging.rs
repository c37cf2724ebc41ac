//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per binary
//! - Configure log level from config, overridable by `RUST_LOG`
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `RUST_LOG` always wins over the configured level

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter: `level` for this crate, `tower_http` at the same level.
pub fn default_filter(level: &str) -> String {
    format!("codereview_gateway={level},tower_http={level}")
}

/// Initialize the global subscriber.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level).into());

    // A second initialization (e.g. in tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
