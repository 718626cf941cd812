//! The per-symbol indicator snapshot consumers read (§3, §4.3).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Support/resistance and pattern-detector fields, refreshed on the 5-minute
/// background cadence. Not entry-gating; present in the original system but
/// dropped from the distilled operations list (SPEC_FULL §4.3 supplement).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SecondaryIndicators {
    pub support: Option<Decimal>,
    pub resistance: Option<Decimal>,
    /// True if the last two closes traced a higher-high/higher-low pattern.
    pub uptrend_pattern: bool,
}

/// Coherent, point-in-time view of one symbol's indicators. A consumer that
/// reads a snapshot always sees values that were internally consistent when
/// taken — no torn reads of one field mid-update of another.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub sma15m_50: Option<Decimal>,
    pub sma15m_200: Option<Decimal>,
    pub sma_daily_20: Option<Decimal>,
    pub sma_daily_50: Option<Decimal>,
    pub rsi15m_14: Option<Decimal>,
    pub rank_gm: Decimal,
    pub rank_gm_prev: Option<Decimal>,
    pub accel: Decimal,
    pub rank_final: Decimal,
    pub secondary: SecondaryIndicators,
    pub updated_at: DateTime<Utc>,
}
