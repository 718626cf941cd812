//! Single-writer / many-reader tick store (§4.2, §5).
//!
//! The broker's tick reader task is the sole writer; the scanner, the
//! trailing worker, and the dashboard (out of scope, an observer) read a
//! point-in-time snapshot. `parking_lot::RwLock` gives readers a cheap,
//! non-blocking-in-practice path with no read-modify-write exposed.

use crate::{error::DataError, tick::TickSnapshot};
use chrono::Duration;
use engine_markets::{InstrumentManifest, InstrumentToken, Symbol};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Tolerance beyond which an incoming tick is rejected as stale (§4.2).
pub const STALE_TICK_TOLERANCE: Duration = Duration::minutes(2);

#[derive(Debug, Default)]
struct Inner {
    by_symbol: HashMap<Symbol, TickSnapshot>,
}

#[derive(Debug, Default)]
pub struct TickStore {
    inner: RwLock<Inner>,
    pub(crate) stale_tick_count: std::sync::atomic::AtomicU64,
}

impl TickStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies an incoming tick. The single writer calls this from the
    /// broker tick reader task; the `symbol -> lastPrice` view updates in
    /// the same critical section as the per-token view.
    pub fn ingest(
        &self,
        manifest: &InstrumentManifest,
        token: InstrumentToken,
        last_price: rust_decimal::Decimal,
        ts: chrono::DateTime<chrono::Utc>,
    ) -> Result<Symbol, DataError> {
        let symbol = manifest.symbol_for_token(token)?.clone();
        let mut inner = self.inner.write();
        if let Some(existing) = inner.by_symbol.get(&symbol) {
            if ts < existing.ts - STALE_TICK_TOLERANCE {
                self.stale_tick_count
                    .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                return Err(DataError::StaleTick { token: token.0, ts });
            }
        }
        inner
            .by_symbol
            .insert(symbol.clone(), TickSnapshot { last_price, ts });
        Ok(symbol)
    }

    /// Point-in-time snapshot read; never exposes the write lock to readers.
    pub fn last(&self, symbol: &Symbol) -> Option<TickSnapshot> {
        self.inner.read().by_symbol.get(symbol).copied()
    }

    pub fn stale_tick_count(&self) -> u64 {
        self.stale_tick_count.load(std::sync::atomic::Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use engine_markets::InstrumentSpec;
    use rust_decimal_macros::dec;

    fn manifest() -> InstrumentManifest {
        InstrumentManifest::build([InstrumentSpec {
            symbol: Symbol::new("X"),
            token: InstrumentToken(1),
            tick_size: dec!(0.05),
            lot_size: 1,
        }])
        .unwrap()
    }

    #[test]
    fn stale_tick_is_rejected_and_counted() {
        let store = TickStore::new();
        let manifest = manifest();
        let t0 = Utc.with_ymd_and_hms(2026, 7, 31, 10, 0, 0).unwrap();
        store
            .ingest(&manifest, InstrumentToken(1), dec!(100), t0)
            .unwrap();

        let stale_ts = t0 - Duration::minutes(3);
        let err = store
            .ingest(&manifest, InstrumentToken(1), dec!(99), stale_ts)
            .unwrap_err();
        assert!(matches!(err, DataError::StaleTick { .. }));
        assert_eq!(store.stale_tick_count(), 1);
        // last-known price is unchanged by the rejected tick
        assert_eq!(store.last(&Symbol::new("X")).unwrap().last_price, dec!(100));
    }

    #[test]
    fn snapshot_reflects_latest_tick() {
        let store = TickStore::new();
        let manifest = manifest();
        let t0 = Utc.with_ymd_and_hms(2026, 7, 31, 10, 0, 0).unwrap();
        store
            .ingest(&manifest, InstrumentToken(1), dec!(100), t0)
            .unwrap();
        store
            .ingest(&manifest, InstrumentToken(1), dec!(101), t0 + Duration::seconds(1))
            .unwrap();
        assert_eq!(store.last(&Symbol::new("X")).unwrap().last_price, dec!(101));
    }
}
