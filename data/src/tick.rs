//! Raw broker ticks: lossy, only the latest per symbol is retained.

use chrono::{DateTime, Utc};
use engine_markets::InstrumentToken;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single price update from the broker's tick feed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub token: InstrumentToken,
    pub last_price: Decimal,
    pub ts: DateTime<Utc>,
    /// Cumulative traded volume delta reported by the feed for this tick.
    pub volume_delta: u64,
}

/// Point-in-time snapshot handed to readers of the [`crate::tick_store::TickStore`].
///
/// Readers always get a copy; no read-modify-write is possible through this type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickSnapshot {
    pub last_price: Decimal,
    pub ts: DateTime<Utc>,
}
