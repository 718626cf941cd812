//! The Trade entity (§3): a single ladder position with its protective
//! conditional order attached.

use crate::ids::TradeId;
use chrono::{DateTime, Utc};
use engine_execution::{GttId, OrderId};
use engine_markets::Symbol;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Paper,
    Live,
}

/// Position within a symbol's three-stage ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionIndex {
    P1,
    P2,
    P3,
}

impl PositionIndex {
    pub fn as_u8(self) -> u8 {
        match self {
            Self::P1 => 1,
            Self::P2 => 2,
            Self::P3 => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeStatus {
    Pending,
    Open,
    /// The owning ConditionalOrder failed to re-place after a broker-side
    /// cancellation; an emergency unwind is in flight.
    ProtectionCompromised,
    Closing,
    Closed,
    Failed,
}

/// Fields fixed at creation, supplied by the caller (the scanner).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTrade {
    pub symbol: Symbol,
    pub position_index: PositionIndex,
    pub entry_ts: DateTime<Utc>,
    pub entry_price: Decimal,
    pub qty: u64,
    pub mode: Mode,
    pub stop_loss_pct_config: Decimal,
    pub target_pct_config: Option<Decimal>,
    pub rank_gm_at_entry: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,

    // immutable on create
    pub symbol: Symbol,
    pub position_index: PositionIndex,
    pub entry_ts: DateTime<Utc>,
    pub entry_price: Decimal,
    pub qty: u64,
    pub mode: Mode,
    pub stop_loss_pct_config: Decimal,
    pub target_pct_config: Option<Decimal>,
    pub rank_gm_at_entry: Decimal,

    // mutable during life
    pub highest_since_entry: Decimal,
    pub current_stop_price: Decimal,
    pub current_target_price: Option<Decimal>,
    pub gtt_id: Option<GttId>,
    pub order_id: Option<OrderId>,
    pub status: TradeStatus,

    // set on close
    pub exit_ts: Option<DateTime<Utc>>,
    pub exit_price: Option<Decimal>,
    pub realized_pnl: Option<Decimal>,
}

impl Trade {
    pub fn pending(id: TradeId, new: NewTrade) -> Self {
        Self {
            id,
            symbol: new.symbol,
            position_index: new.position_index,
            entry_ts: new.entry_ts,
            entry_price: new.entry_price,
            qty: new.qty,
            mode: new.mode,
            stop_loss_pct_config: new.stop_loss_pct_config,
            target_pct_config: new.target_pct_config,
            rank_gm_at_entry: new.rank_gm_at_entry,
            highest_since_entry: new.entry_price,
            current_stop_price: new.entry_price * (Decimal::ONE + new.stop_loss_pct_config),
            current_target_price: new
                .target_pct_config
                .map(|pct| new.entry_price * (Decimal::ONE + pct)),
            gtt_id: None,
            order_id: None,
            status: TradeStatus::Pending,
            exit_ts: None,
            exit_price: None,
            realized_pnl: None,
        }
    }

    /// Signed percentage P&L against `last_price` (positive for a winning long).
    pub fn pnl_pct(&self, last_price: Decimal) -> Decimal {
        if self.entry_price.is_zero() {
            return Decimal::ZERO;
        }
        (last_price - self.entry_price) / self.entry_price * Decimal::from(100)
    }

    pub fn is_open(&self) -> bool {
        matches!(self.status, TradeStatus::Open | TradeStatus::ProtectionCompromised)
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
    fn pending_trade_derives_stop_and_target_from_entry() {
        let trade = Trade::pending(
            TradeId(1),
            NewTrade {
                symbol: Symbol::new("X"),
                position_index: PositionIndex::P1,
                entry_ts: now(),
                entry_price: dec!(103.00),
                qty: 29,
                mode: Mode::Paper,
                stop_loss_pct_config: dec!(-0.025),
                target_pct_config: Some(dec!(0.05)),
                rank_gm_at_entry: dec!(4.796),
            },
        );
        assert_eq!(trade.current_stop_price, dec!(100.425));
        assert_eq!(trade.current_target_price, Some(dec!(108.15)));
        assert_eq!(trade.status, TradeStatus::Pending);
    }

    #[test]
    fn pnl_pct_reflects_price_move_from_entry() {
        let trade = Trade::pending(
            TradeId(1),
            NewTrade {
                symbol: Symbol::new("X"),
                position_index: PositionIndex::P1,
                entry_ts: now(),
                entry_price: dec!(103.00),
                qty: 29,
                mode: Mode::Paper,
                stop_loss_pct_config: dec!(-0.025),
                target_pct_config: None,
                rank_gm_at_entry: dec!(0),
            },
        );
        assert_eq!(trade.pnl_pct(dec!(103.30)).round_dp(3), dec!(0.291));
    }
}
