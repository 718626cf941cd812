//! Strategy Scanner (§4.5): the 60s cooperative cycle that ranks the
//! universe, reconciles the open ladder, and places fresh entries.
//!
//! Session time is read off `now.time()` directly; the engine is assumed to
//! run with its system clock already set to the exchange's local time
//! rather than carrying a timezone conversion layer.

use crate::{
    config::ScannerConfig,
    error::StrategyError,
    policy::{LadderGate, PositionPolicy},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use engine_analytics::IndicatorCache;
use engine_data::TickStore;
use engine_execution::{
    BrokerGateway, ConditionalOrderKind, ConditionalOrderSpec, OrderId,
};
use engine_markets::{InstrumentManifest, Side, Symbol};
use engine_risk::{passes_anti_flip, CooldownRegistry};
use engine_trader::{FillObserver, Mode, NewTrade, PositionIndex, PositionStore, TradeId};
use parking_lot::Mutex;
use rust_decimal::{prelude::ToPrimitive, Decimal};
use std::{collections::HashMap, sync::Arc};

pub struct Scanner {
    config: ScannerConfig,
    manifest: Arc<InstrumentManifest>,
    ticks: Arc<TickStore>,
    indicators: Arc<IndicatorCache>,
    store: Arc<dyn PositionStore>,
    cooldown: Arc<CooldownRegistry>,
    gateway: Arc<dyn BrokerGateway>,
    mode: Mode,
    /// Orders placed for a not-yet-activated Trade, keyed so the eventual
    /// fill can be matched back without the Position Store's `byOrderId`
    /// index (which only exists once the Trade is `activate`d).
    pending_orders: Mutex<HashMap<OrderId, TradeId>>,
}

impl Scanner {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: ScannerConfig,
        manifest: Arc<InstrumentManifest>,
        ticks: Arc<TickStore>,
        indicators: Arc<IndicatorCache>,
        store: Arc<dyn PositionStore>,
        cooldown: Arc<CooldownRegistry>,
        gateway: Arc<dyn BrokerGateway>,
        mode: Mode,
    ) -> Self {
        Self {
            config,
            manifest,
            ticks,
            indicators,
            store,
            cooldown,
            gateway,
            mode,
            pending_orders: Mutex::new(HashMap::new()),
        }
    }

    /// One full scanner cycle (§4.5 steps 1-4). A clock-gated no-op outside
    /// the trading session.
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> Result<(), StrategyError> {
        let local_time = now.time();
        if !self.config.session.contains(local_time) {
            return Ok(());
        }
        if self
            .config
            .session
            .is_session_open(local_time, self.config.period_secs as u32)
        {
            self.indicators.reset_rank_history();
        }

        self.refresh_ranking(now);
        self.reconcile_ladder(now).await?;
        self.scan_fresh_entries(now).await?;
        Ok(())
    }

    fn refresh_ranking(&self, now: DateTime<Utc>) {
        for symbol in self.manifest.universe() {
            let Some(tick) = self.ticks.last(symbol) else {
                continue;
            };
            self.indicators
                .refresh_primary(symbol, tick.last_price, self.config.accel_weight, now);
        }
    }

    async fn reconcile_ladder(&self, now: DateTime<Utc>) -> Result<(), StrategyError> {
        for symbol in self.manifest.universe() {
            let Some(last_price) = self.ticks.last(symbol).map(|t| t.last_price) else {
                continue;
            };
            let p1 = self.store.open_by_key(symbol, PositionIndex::P1);
            let p2 = self.store.open_by_key(symbol, PositionIndex::P2);
            let p3 = self.store.open_by_key(symbol, PositionIndex::P3);

            if let Some(p1) = &p1 {
                if p2.is_none() && Self::gate_passes(PositionIndex::P2, p1, None, last_price) {
                    if self.capacity_and_cooldown_ok(symbol, now) {
                        self.place_entry(symbol, PositionIndex::P2, now).await?;
                    }
                    continue;
                }
                if let Some(p2) = &p2 {
                    if p3.is_none() && Self::gate_passes(PositionIndex::P3, p1, Some(p2), last_price)
                        && self.capacity_and_cooldown_ok(symbol, now)
                    {
                        self.place_entry(symbol, PositionIndex::P3, now).await?;
                    }
                }
            }
        }
        Ok(())
    }

    fn gate_passes(
        index: PositionIndex,
        p1: &engine_trader::Trade,
        p2: Option<&engine_trader::Trade>,
        last_price: Decimal,
    ) -> bool {
        match PositionPolicy::for_index(index).gate {
            Some(LadderGate::P1PnlAtLeast(threshold)) => p1.pnl_pct(last_price) >= threshold,
            Some(LadderGate::MeanP1P2AtLeast(threshold)) => {
                let Some(p2) = p2 else { return false };
                let mean = (p1.pnl_pct(last_price) + p2.pnl_pct(last_price)) / Decimal::TWO;
                mean >= threshold
            }
            None => false,
        }
    }

    fn capacity_and_cooldown_ok(&self, symbol: &Symbol, now: DateTime<Utc>) -> bool {
        self.store.open_all().len() < self.config.max_positions
            && self.cooldown.is_allowed(symbol, now, self.config.cooldown_seconds).allowed
    }

    async fn scan_fresh_entries(&self, now: DateTime<Utc>) -> Result<(), StrategyError> {
        let mut candidates: Vec<(Symbol, Decimal)> = self
            .manifest
            .universe()
            .filter(|symbol| self.store.open_by_symbol(symbol).is_empty())
            .filter_map(|symbol| {
                self.indicators
                    .snapshot(symbol)
                    .filter(|snapshot| snapshot.rank_final > self.config.entry_threshold)
                    .map(|snapshot| (symbol.clone(), snapshot.rank_final))
            })
            .collect();
        candidates.sort_by_key(|(_, rank_final)| std::cmp::Reverse(*rank_final));

        for (symbol, _rank_final) in candidates {
            if !self.capacity_and_cooldown_ok(&symbol, now) {
                continue;
            }
            if self.free_capital() < self.config.capital_per_position {
                continue;
            }
            let Some(last_price) = self.ticks.last(&symbol).map(|t| t.last_price) else {
                continue;
            };
            let last_exit_price = self.cooldown.entry(&symbol).map(|entry| entry.last_exit_price);
            if !passes_anti_flip(last_price, last_exit_price, self.config.anti_flip_pct) {
                continue;
            }

            self.place_entry(&symbol, PositionIndex::P1, now).await?;
            // single-open-per-cycle: stop after the first fresh entry.
            break;
        }
        Ok(())
    }

    fn free_capital(&self) -> Decimal {
        let used: Decimal = self
            .store
            .open_all()
            .iter()
            .map(|trade| trade.entry_price * Decimal::from(trade.qty))
            .sum();
        self.config.total_capital - used
    }

    /// Entry placement protocol steps 1-2 (§4.5): places the market order and
    /// creates the pending Trade, remembering the `orderId -> TradeId`
    /// mapping so [`Scanner::handle_fill`] can complete steps 3-5 once the
    /// fill is reported.
    async fn place_entry(
        &self,
        symbol: &Symbol,
        position_index: PositionIndex,
        now: DateTime<Utc>,
    ) -> Result<(), StrategyError> {
        let spec = self.manifest.spec(symbol).map_err(|_| StrategyError::InsufficientNotional {
            symbol: symbol.clone(),
            price: Decimal::ZERO,
        })?;
        let Some(last_price) = self.ticks.last(symbol).map(|t| t.last_price) else {
            return Ok(());
        };
        let qty = size_entry(self.config.capital_per_position, last_price, spec.lot_size);
        if qty == 0 {
            return Err(StrategyError::InsufficientNotional {
                symbol: symbol.clone(),
                price: last_price,
            });
        }

        let order_id = self
            .gateway
            .place_market_order(symbol, Side::Buy, qty)
            .await?;

        let policy = PositionPolicy::for_index(position_index);
        let rank_gm_at_entry = self
            .indicators
            .snapshot(symbol)
            .map(|snapshot| snapshot.rank_gm)
            .unwrap_or(Decimal::ZERO);
        let trade_id = self.store.create_pending(NewTrade {
            symbol: symbol.clone(),
            position_index,
            entry_ts: now,
            entry_price: last_price,
            qty,
            mode: self.mode,
            stop_loss_pct_config: policy.stop_pct,
            target_pct_config: policy.target_pct,
            rank_gm_at_entry,
        });
        self.pending_orders.lock().insert(order_id, trade_id);
        tracing::info!(?order_id, %symbol, ?position_index, qty, "entry order placed");
        Ok(())
    }

    /// Entry placement protocol steps 3-5: called once the order event
    /// router (or whatever consumes `subscribe_order_updates`) observes this
    /// order's fill. A no-op if `order_id` isn't one this scanner placed.
    pub async fn handle_fill(
        &self,
        order_id: OrderId,
        fill_price: Decimal,
        exch_ts: DateTime<Utc>,
    ) -> Result<(), StrategyError> {
        let Some(trade_id) = self.pending_orders.lock().remove(&order_id) else {
            return Ok(());
        };
        let Some(trade) = self.store.get(trade_id) else {
            return Ok(());
        };

        let policy = PositionPolicy::for_index(trade.position_index);
        let stop = fill_price * (Decimal::ONE + policy.stop_pct);
        let target = policy.target_pct.map(|pct| fill_price * (Decimal::ONE + pct));
        let kind = if target.is_some() {
            ConditionalOrderKind::StopAndTarget
        } else {
            ConditionalOrderKind::StopOnly
        };
        let spec = ConditionalOrderSpec {
            symbol: trade.symbol.clone(),
            kind,
            trigger_price_stop: stop,
            trigger_price_target: target,
            qty: trade.qty,
        };

        match self.gateway.place_conditional_order(spec).await {
            Ok((gtt_id, rounded)) => {
                self.store.activate(
                    trade_id,
                    order_id,
                    gtt_id,
                    fill_price,
                    rounded.trigger_price_stop,
                    rounded.trigger_price_target,
                )?;
                Ok(())
            }
            Err(error) => {
                tracing::error!(?error, trade_id = ?trade_id, "conditional order placement failed, rolling back");
                self.store.mark_failed(trade_id, "conditional order placement failed")?;
                if let Err(unwind_error) = self
                    .gateway
                    .place_market_order(&trade.symbol, Side::Sell, trade.qty)
                    .await
                {
                    tracing::error!(?unwind_error, trade_id = ?trade_id, "emergency unwind failed");
                }
                self.cooldown.record(trade.symbol.clone(), exch_ts, fill_price);
                Err(error.into())
            }
        }
    }
}

#[async_trait]
impl FillObserver for Scanner {
    async fn on_fill(&self, order_id: OrderId, price: Decimal, exch_ts: DateTime<Utc>) {
        if let Err(error) = self.handle_fill(order_id, price, exch_ts).await {
            tracing::error!(?error, ?order_id, "failed to handle order fill");
        }
    }
}

/// `floor(capitalPerPosition / lastPrice / lotSize) * lotSize` (§4.5.5).
fn size_entry(capital_per_position: Decimal, last_price: Decimal, lot_size: u64) -> u64 {
    if last_price.is_zero() || lot_size == 0 {
        return 0;
    }
    let lots = (capital_per_position / last_price / Decimal::from(lot_size)).floor();
    (lots * Decimal::from(lot_size)).to_u64().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn sizes_by_flooring_lots() {
        assert_eq!(size_entry(dec!(3000), dec!(103.00), 1), 29);
    }

    #[test]
    fn zero_last_price_sizes_to_zero() {
        assert_eq!(size_entry(dec!(3000), dec!(0), 1), 0);
    }

    #[test]
    fn lot_size_rounds_down_to_a_whole_lot() {
        assert_eq!(size_entry(dec!(3000), dec!(28.50), 100), 100);
    }
}
