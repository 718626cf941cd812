//! OHLCV candle accumulation (§3, §4.2).

use crate::timeframe::Timeframe;
use chrono::{DateTime, Utc};
use engine_markets::Symbol;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A bar, accumulated monotonically within its window and frozen at the
/// boundary. Primary key for persistence is `(timeframe, symbol, start_ts)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub symbol: Symbol,
    pub timeframe: Timeframe,
    pub start_ts: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}

impl Candle {
    pub fn open(symbol: Symbol, timeframe: Timeframe, start_ts: DateTime<Utc>, price: Decimal, volume_delta: u64) -> Self {
        Self {
            symbol,
            timeframe,
            start_ts,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: volume_delta,
        }
    }

    pub fn update(&mut self, price: Decimal, volume_delta: u64) {
        self.close = price;
        self.high = self.high.max(price);
        self.low = self.low.min(price);
        self.volume += volume_delta;
    }
}
