//! Scanner tunables (§4.5, §6 configuration surface). All thresholds are
//! overridable; the defaults are the spec's tabulated values.

use engine_markets::SessionWindow;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Target notional per fresh entry.
    pub capital_per_position: Decimal,
    /// Total capital available across all open Trades.
    pub total_capital: Decimal,
    /// Global cap on simultaneously open Trades.
    pub max_positions: usize,
    /// `rankFinal` must exceed this (strict) for a symbol to be a candidate.
    pub entry_threshold: Decimal,
    /// Weight applied to `accel` when computing `rankFinal`.
    pub accel_weight: Decimal,
    /// Cooldown window after an exit, before a symbol is eligible again.
    pub cooldown_seconds: i64,
    /// Scanner cycle period.
    pub period_secs: u64,
    pub session: SessionWindow,
    /// `antiFlipPct`: fraction price must recover past a symbol's last exit
    /// before a fresh entry is allowed (§6).
    pub anti_flip_pct: Decimal,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            capital_per_position: dec!(3000),
            total_capital: dec!(150000),
            max_positions: 50,
            entry_threshold: dec!(2.5),
            accel_weight: dec!(0.3),
            cooldown_seconds: 180,
            period_secs: 60,
            session: SessionWindow::default(),
            anti_flip_pct: dec!(0.0025),
        }
    }
}
