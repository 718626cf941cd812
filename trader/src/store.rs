//! Position Store (§4.4): the durable record of open/closed Trades.
//! `InMemoryPositionStore` keeps one namespace per [`Mode`] so `setMode`
//! reloads the open set from the new namespace and leaves the old one
//! untouched, with no reload step required.

use crate::{
    error::TradeError,
    ids::TradeId,
    trade::{Mode, NewTrade, PositionIndex, Trade, TradeStatus},
};
use chrono::{DateTime, Utc};
use engine_execution::{GttId, OrderId};
use engine_markets::Symbol;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;

pub trait PositionStore: Send + Sync {
    fn create_pending(&self, new_trade: NewTrade) -> TradeId;
    fn get(&self, id: TradeId) -> Option<Trade>;
    #[allow(clippy::too_many_arguments)]
    fn activate(
        &self,
        id: TradeId,
        order_id: OrderId,
        gtt_id: GttId,
        fill_price: Decimal,
        stop_price: Decimal,
        target_price: Option<Decimal>,
    ) -> Result<(), TradeError>;
    fn update_stop(
        &self,
        id: TradeId,
        new_stop: Decimal,
        new_high: Decimal,
        new_gtt_id: Option<GttId>,
    ) -> Result<(), TradeError>;
    fn close(
        &self,
        id: TradeId,
        exit_price: Decimal,
        exit_ts: DateTime<Utc>,
        pnl: Decimal,
    ) -> Result<(), TradeError>;
    fn mark_failed(&self, id: TradeId, reason: &str) -> Result<(), TradeError>;
    fn mark_protection_compromised(&self, id: TradeId) -> Result<(), TradeError>;

    fn open_by_key(&self, symbol: &Symbol, position_index: PositionIndex) -> Option<Trade>;
    fn open_by_symbol(&self, symbol: &Symbol) -> Vec<Trade>;
    fn open_all(&self) -> Vec<Trade>;
    fn by_order_id(&self, order_id: OrderId) -> Option<Trade>;
    fn by_gtt_id(&self, gtt_id: GttId) -> Option<Trade>;

    /// Switches the active namespace; the prior namespace's Trades are kept
    /// untouched and become reachable again on a switch back.
    fn set_mode(&self, mode: Mode);
    fn mode(&self) -> Mode;
}

#[derive(Default)]
struct Namespace {
    trades: HashMap<TradeId, Trade>,
    by_order_id: HashMap<OrderId, TradeId>,
    by_gtt_id: HashMap<GttId, TradeId>,
    next_id: u64,
}

impl Namespace {
    fn next_id(&mut self) -> TradeId {
        self.next_id += 1;
        TradeId(self.next_id)
    }
}

struct State {
    mode: Mode,
    paper: Namespace,
    live: Namespace,
}

impl State {
    fn namespace(&self, mode: Mode) -> &Namespace {
        match mode {
            Mode::Paper => &self.paper,
            Mode::Live => &self.live,
        }
    }

    fn namespace_mut(&mut self, mode: Mode) -> &mut Namespace {
        match mode {
            Mode::Paper => &mut self.paper,
            Mode::Live => &mut self.live,
        }
    }
}

/// `parking_lot::RwLock`-guarded, indexed by `orderId`/`gttId` exactly as
/// the `byOrderId`/`byGttId` operations require.
pub struct InMemoryPositionStore {
    state: RwLock<State>,
}

impl Default for InMemoryPositionStore {
    fn default() -> Self {
        Self {
            state: RwLock::new(State {
                mode: Mode::Paper,
                paper: Namespace::default(),
                live: Namespace::default(),
            }),
        }
    }
}

impl InMemoryPositionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_trade<R>(
        &self,
        id: TradeId,
        f: impl FnOnce(&mut Trade) -> Result<R, TradeError>,
    ) -> Result<R, TradeError> {
        let mut state = self.state.write();
        let mode = state.mode;
        let trade = state
            .namespace_mut(mode)
            .trades
            .get_mut(&id)
            .ok_or(TradeError::NotFound(id))?;
        f(trade)
    }
}

impl PositionStore for InMemoryPositionStore {
    fn create_pending(&self, new_trade: NewTrade) -> TradeId {
        let mut state = self.state.write();
        let mode = state.mode;
        let namespace = state.namespace_mut(mode);
        let id = namespace.next_id();
        let trade = Trade::pending(id, new_trade);
        namespace.trades.insert(id, trade);
        id
    }

    fn get(&self, id: TradeId) -> Option<Trade> {
        let state = self.state.read();
        state.namespace(state.mode).trades.get(&id).cloned()
    }

    fn activate(
        &self,
        id: TradeId,
        order_id: OrderId,
        gtt_id: GttId,
        fill_price: Decimal,
        stop_price: Decimal,
        target_price: Option<Decimal>,
    ) -> Result<(), TradeError> {
        let mut state = self.state.write();
        let mode = state.mode;
        {
            let namespace = state.namespace_mut(mode);
            let trade = namespace
                .trades
                .get_mut(&id)
                .ok_or(TradeError::NotFound(id))?;
            if trade.status != TradeStatus::Pending {
                return Err(TradeError::InvalidStateTransition {
                    trade_id: id,
                    from: trade.status,
                    action: "activate",
                });
            }
            trade.entry_price = fill_price;
            trade.highest_since_entry = fill_price;
            trade.current_stop_price = stop_price;
            trade.current_target_price = target_price;
            trade.order_id = Some(order_id);
            trade.gtt_id = Some(gtt_id);
            trade.status = TradeStatus::Open;
            namespace.by_order_id.insert(order_id, id);
            namespace.by_gtt_id.insert(gtt_id, id);
        }
        Ok(())
    }

    fn update_stop(
        &self,
        id: TradeId,
        new_stop: Decimal,
        new_high: Decimal,
        new_gtt_id: Option<GttId>,
    ) -> Result<(), TradeError> {
        let mut state = self.state.write();
        let mode = state.mode;
        let namespace = state.namespace_mut(mode);
        let trade = namespace
            .trades
            .get_mut(&id)
            .ok_or(TradeError::NotFound(id))?;
        if !trade.is_open() {
            return Err(TradeError::InvalidStateTransition {
                trade_id: id,
                from: trade.status,
                action: "update_stop",
            });
        }
        trade.current_stop_price = new_stop;
        trade.highest_since_entry = new_high;
        if let Some(gtt_id) = new_gtt_id {
            if let Some(old) = trade.gtt_id.replace(gtt_id) {
                namespace.by_gtt_id.remove(&old);
            }
            namespace.by_gtt_id.insert(gtt_id, id);
        }
        Ok(())
    }

    fn close(
        &self,
        id: TradeId,
        exit_price: Decimal,
        exit_ts: DateTime<Utc>,
        pnl: Decimal,
    ) -> Result<(), TradeError> {
        self.with_trade(id, |trade| {
            trade.status = TradeStatus::Closed;
            trade.exit_price = Some(exit_price);
            trade.exit_ts = Some(exit_ts);
            trade.realized_pnl = Some(pnl);
            Ok(())
        })
    }

    fn mark_failed(&self, id: TradeId, _reason: &str) -> Result<(), TradeError> {
        self.with_trade(id, |trade| {
            trade.status = TradeStatus::Failed;
            Ok(())
        })
    }

    fn mark_protection_compromised(&self, id: TradeId) -> Result<(), TradeError> {
        self.with_trade(id, |trade| {
            trade.status = TradeStatus::ProtectionCompromised;
            Ok(())
        })
    }

    fn open_by_key(&self, symbol: &Symbol, position_index: PositionIndex) -> Option<Trade> {
        let state = self.state.read();
        state
            .namespace(state.mode)
            .trades
            .values()
            .find(|trade| {
                trade.is_open() && &trade.symbol == symbol && trade.position_index == position_index
            })
            .cloned()
    }

    fn open_by_symbol(&self, symbol: &Symbol) -> Vec<Trade> {
        let state = self.state.read();
        state
            .namespace(state.mode)
            .trades
            .values()
            .filter(|trade| trade.is_open() && &trade.symbol == symbol)
            .cloned()
            .collect()
    }

    fn open_all(&self) -> Vec<Trade> {
        let state = self.state.read();
        state
            .namespace(state.mode)
            .trades
            .values()
            .filter(|trade| trade.is_open())
            .cloned()
            .collect()
    }

    fn by_order_id(&self, order_id: OrderId) -> Option<Trade> {
        let state = self.state.read();
        let namespace = state.namespace(state.mode);
        namespace
            .by_order_id
            .get(&order_id)
            .and_then(|id| namespace.trades.get(id))
            .cloned()
    }

    fn by_gtt_id(&self, gtt_id: GttId) -> Option<Trade> {
        let state = self.state.read();
        let namespace = state.namespace(state.mode);
        namespace
            .by_gtt_id
            .get(&gtt_id)
            .and_then(|id| namespace.trades.get(id))
            .cloned()
    }

    fn set_mode(&self, mode: Mode) {
        self.state.write().mode = mode;
    }

    fn mode(&self) -> Mode {
        self.state.read().mode
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

    fn new_trade(symbol: &str) -> NewTrade {
        NewTrade {
            symbol: Symbol::new(symbol),
            position_index: PositionIndex::P1,
            entry_ts: now(),
            entry_price: dec!(103.00),
            qty: 29,
            mode: Mode::Paper,
            stop_loss_pct_config: dec!(-0.025),
            target_pct_config: Some(dec!(0.05)),
            rank_gm_at_entry: dec!(4.796),
        }
    }

    #[test]
    fn activate_indexes_by_order_and_gtt_id() {
        let store = InMemoryPositionStore::new();
        let id = store.create_pending(new_trade("X"));
        store
            .activate(id, OrderId(1), GttId(1), dec!(103.00), dec!(100.425), Some(dec!(108.15)))
            .unwrap();

        assert_eq!(store.by_order_id(OrderId(1)).unwrap().id, id);
        assert_eq!(store.by_gtt_id(GttId(1)).unwrap().id, id);
        assert_eq!(
            store
                .open_by_key(&Symbol::new("X"), PositionIndex::P1)
                .unwrap()
                .id,
            id
        );
    }

    #[test]
    fn switching_mode_leaves_other_namespace_untouched() {
        let store = InMemoryPositionStore::new();
        let paper_id = store.create_pending(new_trade("X"));
        store
            .activate(paper_id, OrderId(1), GttId(1), dec!(103.00), dec!(100.425), Some(dec!(108.15)))
            .unwrap();

        store.set_mode(Mode::Live);
        assert!(store.open_all().is_empty());

        let live_id = store.create_pending(new_trade("Y"));
        store
            .activate(live_id, OrderId(2), GttId(2), dec!(50.00), dec!(48.75), None)
            .unwrap();
        assert_eq!(store.open_all().len(), 1);

        store.set_mode(Mode::Paper);
        assert_eq!(store.open_all().len(), 1);
        assert_eq!(store.open_all()[0].id, paper_id);
    }

    #[test]
    fn close_on_unknown_trade_fails() {
        let store = InMemoryPositionStore::new();
        let err = store
            .close(TradeId(999), dec!(1), now(), dec!(0))
            .unwrap_err();
        assert!(matches!(err, TradeError::NotFound(_)));
    }
}
