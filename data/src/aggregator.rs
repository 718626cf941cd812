//! Per-symbol per-timeframe candle aggregation and boundary emission (§4.2).

use crate::{candle::Candle, error::DataError, timeframe::Timeframe};
use chrono::{DateTime, Utc};
use engine_markets::Symbol;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Trait the candle boundary task emits frozen bars to. Implemented by the
/// persistence collaborator (§6); upsert must be idempotent on
/// `(timeframe, symbol, start_ts)` since bar re-delivery can happen.
pub trait CandleSink: Send + Sync {
    fn upsert_candle(&self, candle: Candle);
}

/// No-op sink used where persistence is not wired (tests, `demos/`).
#[derive(Debug, Default)]
pub struct NullCandleSink;

impl CandleSink for NullCandleSink {
    fn upsert_candle(&self, _candle: Candle) {}
}

/// Holds in-progress bars for every configured timeframe, keyed by
/// `(symbol, timeframe, barStart)`. The only mutator is [`CandleAggregator::on_tick`];
/// the boundary task calls [`CandleAggregator::drain_closed`] on its own cadence.
#[derive(Debug)]
pub struct CandleAggregator {
    timeframes: Vec<Timeframe>,
    bars: Mutex<HashMap<(Symbol, Timeframe, DateTime<Utc>), Candle>>,
    /// `barStart` of the most recent bar drained for each `(symbol,
    /// timeframe)`; a tick whose own `barStart` is at or before this has
    /// already been closed out and must not reopen it (§4.2, §8).
    last_closed: Mutex<HashMap<(Symbol, Timeframe), DateTime<Utc>>>,
    out_of_order_count: std::sync::atomic::AtomicU64,
}

impl CandleAggregator {
    pub fn new(timeframes: Vec<Timeframe>) -> Self {
        assert!(
            timeframes.contains(&Timeframe::M15),
            "at least a 15m timeframe must be configured"
        );
        Self {
            timeframes,
            bars: Mutex::new(HashMap::new()),
            last_closed: Mutex::new(HashMap::new()),
            out_of_order_count: std::sync::atomic::AtomicU64::new(0),
        }
    }

    /// Applies a tick to every configured timeframe's in-progress bar. A
    /// tick whose `barStart` is at or before the timeframe's last-drained
    /// boundary is rejected via [`CandleAggregator::reject_out_of_order`]
    /// instead of reopening a closed bar.
    pub fn on_tick(
        &self,
        symbol: &Symbol,
        price: Decimal,
        volume_delta: u64,
        ts: DateTime<Utc>,
    ) {
        let last_closed = self.last_closed.lock();
        let mut bars = self.bars.lock();
        for timeframe in &self.timeframes {
            let start = timeframe.bar_start(ts);
            if let Some(&boundary) = last_closed.get(&(symbol.clone(), *timeframe)) {
                if start <= boundary {
                    let error = self.reject_out_of_order(symbol, start);
                    tracing::debug!(%symbol, ?timeframe, ?error, "dropped out-of-order tick");
                    continue;
                }
            }
            let key = (symbol.clone(), *timeframe, start);
            bars.entry(key)
                .and_modify(|c| c.update(price, volume_delta))
                .or_insert_with(|| Candle::open(symbol.clone(), *timeframe, start, price, volume_delta));
        }
    }

    /// A tick whose bar has already been snapshotted and cleared is dropped
    /// and counted rather than reopening a closed bar.
    pub fn reject_out_of_order(&self, symbol: &Symbol, bar_start: DateTime<Utc>) -> DataError {
        self.out_of_order_count
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        DataError::OutOfOrderBar {
            symbol: symbol.to_string(),
            bar_start,
        }
    }

    pub fn out_of_order_count(&self) -> u64 {
        self.out_of_order_count
            .load(std::sync::atomic::Ordering::Relaxed)
    }

    /// Snapshots every bar whose `start_ts` is strictly before `now`'s bar
    /// start for that timeframe, emits each to `sink`, and clears them.
    pub fn drain_closed(&self, now: DateTime<Utc>, sink: &dyn CandleSink) -> Vec<Candle> {
        let now_floor: HashMap<Timeframe, DateTime<Utc>> = self
            .timeframes
            .iter()
            .map(|tf| (*tf, tf.bar_start(now)))
            .collect();

        let mut bars = self.bars.lock();
        let mut last_closed = self.last_closed.lock();
        let mut closed = Vec::new();
        bars.retain(|(symbol, timeframe, start_ts), candle| {
            let boundary = now_floor[timeframe];
            if *start_ts < boundary {
                closed.push(candle.clone());
                sink.upsert_candle(candle.clone());
                let key = (symbol.clone(), *timeframe);
                let entry = last_closed.entry(key).or_insert(*start_ts);
                if *start_ts > *entry {
                    *entry = *start_ts;
                }
                false
            } else {
                true
            }
        });
        closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn tick_before_bar_start_leaves_aggregator_unchanged() {
        let agg = CandleAggregator::new(vec![Timeframe::M15]);
        let symbol = Symbol::new("X");
        let t0 = Utc.with_ymd_and_hms(2026, 7, 31, 9, 31, 0).unwrap();
        agg.on_tick(&symbol, dec!(100), 10, t0);

        let sink = NullCandleSink;
        let now = t0 + chrono::Duration::minutes(16);
        agg.drain_closed(now, &sink);
        assert!(agg.bars.lock().is_empty());
        assert_eq!(agg.out_of_order_count(), 0);

        // a tick for the just-closed bar must not reopen it.
        let before = agg.bars.lock().clone();
        agg.on_tick(&symbol, dec!(90), 5, t0);
        let after = agg.bars.lock();
        assert_eq!(before, *after);
        assert!(after.is_empty());
        assert_eq!(agg.out_of_order_count(), 1);
    }

    #[test]
    fn boundary_emits_and_clears_closed_bars() {
        let agg = CandleAggregator::new(vec![Timeframe::M15]);
        let symbol = Symbol::new("X");
        let t0 = Utc.with_ymd_and_hms(2026, 7, 31, 9, 31, 0).unwrap();
        agg.on_tick(&symbol, dec!(100), 10, t0);
        agg.on_tick(&symbol, dec!(103), 5, t0 + chrono::Duration::minutes(1));

        let sink = NullCandleSink;
        let now = t0 + chrono::Duration::minutes(16);
        let closed = agg.drain_closed(now, &sink);
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].open, dec!(100));
        assert_eq!(closed[0].close, dec!(103));
        assert_eq!(closed[0].high, dec!(103));
        assert_eq!(closed[0].volume, 15);
        assert!(agg.bars.lock().is_empty());
    }
}
