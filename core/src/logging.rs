//! Standardized `tracing` initialisers for the engine binary (§9 ambient
//! stack). Two flavors: human-readable for a terminal, JSON for log
//! aggregators. Level is controlled by `RUST_LOG` (default `info`).
//!
//! ```rust,ignore
//! use engine_core::logging::init_logging;
//!
//! fn main() {
//!     init_logging();
//!     tracing::info!("trading engine started");
//! }
//! ```

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer())
        .init()
}

pub fn init_json_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
        .init()
}

/// Picks between [`init_logging`] and [`init_json_logging`] based on
/// [`crate::config::LogFormat`].
pub fn init_from_format(format: crate::config::LogFormat) {
    match format {
        crate::config::LogFormat::Human => init_logging(),
        crate::config::LogFormat::Json => init_json_logging(),
    }
}
