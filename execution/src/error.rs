//! Broker error taxonomy (§4.1/§7). Every non-success the gateway surfaces
//! collapses into exactly one of these three variants so callers can dispatch
//! on retry policy without inspecting broker-specific codes.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrokerError {
    /// Broker declined a well-formed request (validation, margin). Not retried.
    #[error("broker rejected request: {reason}")]
    BrokerRejected { reason: String },

    /// Transient I/O/timeout. Retried with exponential backoff.
    #[error("broker unavailable: {reason}")]
    BrokerUnavailable { reason: String },

    /// Authentication expired or otherwise unrecoverable without operator
    /// intervention.
    #[error("broker fatal: {reason}")]
    BrokerFatal { reason: String },
}

impl BrokerError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::BrokerRejected {
            reason: reason.into(),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::BrokerUnavailable {
            reason: reason.into(),
        }
    }

    pub fn fatal(reason: impl Into<String>) -> Self {
        Self::BrokerFatal {
            reason: reason.into(),
        }
    }

    /// Whether the caller's retry loop should attempt this call again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::BrokerUnavailable { .. })
    }
}
