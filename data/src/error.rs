//! Error taxonomy for tick ingestion and candle aggregation.

use engine_markets::ManifestError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DataError {
    /// `ts < lastTs - 2min`: the tick is ignored, not fatal.
    #[error("stale tick for token {token}: ts={ts} lags current by more than the tolerance")]
    StaleTick { token: i64, ts: chrono::DateTime<chrono::Utc> },

    /// A tick arrived for a bar that has already been snapshotted and cleared.
    #[error("out-of-order tick for already-closed bar: symbol={symbol} bar_start={bar_start}")]
    OutOfOrderBar {
        symbol: String,
        bar_start: chrono::DateTime<chrono::Utc>,
    },

    #[error(transparent)]
    Manifest(#[from] ManifestError),
}
