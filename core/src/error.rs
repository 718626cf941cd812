//! Top-level error aggregation (§7). Each crate boundary raises its own
//! `thiserror` enum; everything unrecovered flows up into [`EngineError`],
//! the one type the supervisor's process-level sink logs.

use engine_execution::BrokerError;
use engine_markets::ManifestError;
use engine_trader::TradeError;
use thiserror::Error;

/// Refuses to start. Raised by [`crate::config::EngineConfig::load`] and
/// [`crate::config::EngineConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("fatal configuration error: {0}")]
pub struct FatalConfigError(String);

impl FatalConfigError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(#[from] FatalConfigError),

    #[error("instrument manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("broker error: {0}")]
    Broker(#[from] BrokerError),

    #[error("trade error: {0}")]
    Trade(#[from] TradeError),

    #[error("supervisor task join error: {0}")]
    Join(String),
}

impl From<tokio::task::JoinError> for EngineError {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Join(value.to_string())
    }
}
