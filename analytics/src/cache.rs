//! Indicator cache keyed by symbol (§4.3).
//!
//! Refresh cadence: `refresh_primary` is called by the scanner before each
//! cycle for the entry-gating indicators; `refresh_secondary` runs on the
//! independent 5-minute background cadence. Both mutate behind one lock per
//! symbol so a reader's [`IndicatorSnapshot`] is never torn.

use crate::{
    indicators::{pct_deviation, Rsi},
    rank::{rank_final, rank_gm},
    snapshot::{IndicatorSnapshot, SecondaryIndicators},
    window::RollingWindow,
};
use chrono::{DateTime, Utc};
use engine_markets::Symbol;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;

struct SymbolState {
    window_15m_50: RollingWindow,
    window_15m_200: RollingWindow,
    window_daily_20: RollingWindow,
    window_daily_50: RollingWindow,
    rsi_15m_14: Rsi,
    snapshot: IndicatorSnapshot,
}

impl SymbolState {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            window_15m_50: RollingWindow::new(50),
            window_15m_200: RollingWindow::new(200),
            window_daily_20: RollingWindow::new(20),
            window_daily_50: RollingWindow::new(50),
            rsi_15m_14: Rsi::new(14),
            snapshot: IndicatorSnapshot {
                sma15m_50: None,
                sma15m_200: None,
                sma_daily_20: None,
                sma_daily_50: None,
                rsi15m_14: None,
                rank_gm: Decimal::ZERO,
                rank_gm_prev: None,
                accel: Decimal::ZERO,
                rank_final: Decimal::ZERO,
                secondary: SecondaryIndicators::default(),
                updated_at: now,
            },
        }
    }
}

/// Per-symbol indicator cache. Lazy but coherent: a reader's snapshot was
/// internally consistent at the instant it was taken.
#[derive(Default)]
pub struct IndicatorCache {
    symbols: RwLock<HashMap<Symbol, SymbolState>>,
}

impl IndicatorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a closed 15-minute close into the fast SMA/RSI windows.
    pub fn on_15m_close(&self, symbol: &Symbol, close: Decimal, now: DateTime<Utc>) {
        let mut guard = self.symbols.write();
        let state = guard
            .entry(symbol.clone())
            .or_insert_with(|| SymbolState::new(now));
        state.window_15m_50.push(close);
        state.window_15m_200.push(close);
        state.rsi_15m_14.push(close);
        state.snapshot.sma15m_50 = state.window_15m_50.sma();
        state.snapshot.sma15m_200 = state.window_15m_200.sma();
        state.snapshot.rsi15m_14 = state.rsi_15m_14.value();
    }

    /// Feeds a closed daily close into the daily SMA windows.
    pub fn on_daily_close(&self, symbol: &Symbol, close: Decimal, now: DateTime<Utc>) {
        let mut guard = self.symbols.write();
        let state = guard
            .entry(symbol.clone())
            .or_insert_with(|| SymbolState::new(now));
        state.window_daily_20.push(close);
        state.window_daily_50.push(close);
        state.snapshot.sma_daily_20 = state.window_daily_20.sma();
        state.snapshot.sma_daily_50 = state.window_daily_50.sma();
    }

    /// Entry-gating refresh: recomputes `rankGm`/`accel`/`rankFinal` from
    /// `lastPrice` against `sma15m_50` and `sma_daily_20`, then rolls
    /// `rankGm` into `rankGmPrev` for the next cycle (§8: cycles i<j with no
    /// fills carry `rankGmPrev`(j) == `rankGm`(i)).
    pub fn refresh_primary(
        &self,
        symbol: &Symbol,
        last_price: Decimal,
        accel_weight: Decimal,
        now: DateTime<Utc>,
    ) -> Option<IndicatorSnapshot> {
        let mut guard = self.symbols.write();
        let state = guard.get_mut(symbol)?;
        let sma15m = state.snapshot.sma15m_50?;
        let sma_daily = state.snapshot.sma_daily_20?;
        let pct_15m = pct_deviation(last_price, sma15m)?;
        let pct_daily = pct_deviation(last_price, sma_daily)?;

        let rank = rank_gm(pct_15m, pct_daily);
        let prev = state.snapshot.rank_gm_prev.unwrap_or(Decimal::ZERO);
        let accel = rank - prev;
        let final_rank = rank_final(rank, accel, accel_weight);

        state.snapshot.rank_gm = rank;
        state.snapshot.accel = accel;
        state.snapshot.rank_final = final_rank;
        state.snapshot.updated_at = now;
        // roll forward for next cycle, at the end of this cycle's computation
        state.snapshot.rank_gm_prev = Some(rank);

        Some(state.snapshot)
    }

    /// Low-frequency (5-minute) refresh of non-entry-gating secondary
    /// indicators.
    pub fn refresh_secondary(&self, symbol: &Symbol, secondary: SecondaryIndicators) {
        let mut guard = self.symbols.write();
        if let Some(state) = guard.get_mut(symbol) {
            state.snapshot.secondary = secondary;
        }
    }

    /// Atomic snapshot read.
    pub fn snapshot(&self, symbol: &Symbol) -> Option<IndicatorSnapshot> {
        self.symbols.read().get(symbol).map(|s| s.snapshot)
    }

    /// Resets `rankGmPrev` to `None` for every symbol; called once at
    /// process restart per the invariant that acceleration state is
    /// memory-only (§4.3).
    pub fn reset_rank_history(&self) {
        for state in self.symbols.write().values_mut() {
            state.snapshot.rank_gm_prev = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 31, 10, 0, 0).unwrap()
    }

    #[test]
    fn rank_gm_prev_rolls_across_cycles_with_no_new_candles() {
        let cache = IndicatorCache::new();
        let symbol = Symbol::new("X");
        cache.on_15m_close(&symbol, dec!(99), now());
        cache.on_daily_close(&symbol, dec!(98), now());

        let s1 = cache
            .refresh_primary(&symbol, dec!(100), dec!(0.3), now())
            .unwrap();
        let s2 = cache
            .refresh_primary(&symbol, dec!(100), dec!(0.3), now())
            .unwrap();
        assert_eq!(s2.rank_gm_prev, Some(s1.rank_gm));
    }

    #[test]
    fn missing_sma_yields_no_snapshot_update() {
        let cache = IndicatorCache::new();
        let symbol = Symbol::new("X");
        assert!(cache
            .refresh_primary(&symbol, dec!(100), dec!(0.3), now())
            .is_none());
    }
}
