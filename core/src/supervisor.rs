//! Lifecycle supervisor (§4.9): loads configuration and the symbol universe,
//! resolves tokens, constructs every component in the leaves-first
//! dependency order from §2, and owns the six concurrent tasks from §5.
//!
//! ```text
//! Cooldown -> Tick store -> Indicator cache -> Position store
//!   -> Broker gateway -> Order event router -> Strategy scanner
//!   -> Trailing worker -> Supervisor
//! ```

use crate::{config::EngineConfig, error::EngineError};
use chrono::Utc;
use engine_analytics::IndicatorCache;
use engine_data::{CandleAggregator, CandleSink, TickStore, Timeframe};
use engine_execution::BrokerGateway;
use engine_markets::{InstrumentManifest, InstrumentSpec};
use engine_risk::CooldownRegistry;
use engine_strategies::{config::ScannerConfig, Scanner, TrailingWorker};
use engine_trader::{Mode, OrderEventRouter, PositionStore, TradeId};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration as StdDuration,
};
use tokio::{sync::watch, task::JoinHandle};

/// Broker call deadline used for the tasks the supervisor spawns directly
/// (the gateway's own RPC methods apply this internally too, per §5).
const TRAILING_POLL_INTERVAL: StdDuration = StdDuration::from_millis(200);
const SHUTDOWN_GRACE: StdDuration = StdDuration::from_secs(10);

pub struct Supervisor {
    config: EngineConfig,
    manifest: Arc<InstrumentManifest>,
    ticks: Arc<TickStore>,
    aggregator: Arc<CandleAggregator>,
    indicators: Arc<IndicatorCache>,
    store: Arc<dyn PositionStore>,
    cooldown: Arc<CooldownRegistry>,
    gateway: Arc<dyn BrokerGateway>,
    candle_sink: Arc<dyn CandleSink>,
    scanner: Arc<Scanner>,
    trailing: Arc<TrailingWorker>,
    router: Arc<OrderEventRouter>,
    /// Cleared by [`Supervisor::set_mode`] while the Position Store
    /// namespace swap is in flight; scanner and trailing tasks skip their
    /// cycle while this is false.
    trading_enabled: Arc<AtomicBool>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    tasks: tokio::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl Supervisor {
    /// Constructs every component in dependency order. Does not start any
    /// task; call [`Supervisor::start`] for that.
    pub fn build(
        config: EngineConfig,
        instruments: impl IntoIterator<Item = InstrumentSpec>,
        gateway: Arc<dyn BrokerGateway>,
        store: Arc<dyn PositionStore>,
        candle_sink: Arc<dyn CandleSink>,
    ) -> Result<Self, EngineError> {
        let manifest = Arc::new(InstrumentManifest::build(instruments)?);
        let cooldown = Arc::new(CooldownRegistry::new());
        let ticks = Arc::new(TickStore::new());
        let indicators = Arc::new(IndicatorCache::new());
        let aggregator = Arc::new(CandleAggregator::new(vec![Timeframe::M15, Timeframe::DAILY]));

        store.set_mode(config.mode);

        let scanner_config = ScannerConfig {
            capital_per_position: config.capital_per_position,
            total_capital: config.total_capital,
            max_positions: config.max_positions,
            entry_threshold: config.min_rank_final_threshold,
            accel_weight: config.accel_weight,
            cooldown_seconds: config.cooldown_seconds,
            period_secs: config.scan_interval_seconds,
            session: config.session(),
            anti_flip_pct: config.anti_flip_pct,
        };
        let scanner = Arc::new(Scanner::new(
            scanner_config,
            manifest.clone(),
            ticks.clone(),
            indicators.clone(),
            store.clone(),
            cooldown.clone(),
            gateway.clone(),
            config.mode,
        ));
        let trailing = Arc::new(TrailingWorker::new(
            manifest.clone(),
            store.clone(),
            gateway.clone(),
            config.debounce_seconds,
        ));
        let router = Arc::new(OrderEventRouter::new(
            store.clone(),
            cooldown.clone(),
            gateway.clone(),
            scanner.clone(),
        ));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            config,
            manifest,
            ticks,
            aggregator,
            indicators,
            store,
            cooldown,
            gateway,
            candle_sink,
            scanner,
            trailing,
            router,
            trading_enabled: Arc::new(AtomicBool::new(true)),
            shutdown_tx,
            shutdown_rx,
            tasks: tokio::sync::Mutex::new(Vec::new()),
        })
    }

    pub fn store(&self) -> &Arc<dyn PositionStore> {
        &self.store
    }

    pub fn gateway(&self) -> &Arc<dyn BrokerGateway> {
        &self.gateway
    }

    /// Spawns the six concurrent tasks from §5 and returns once they are
    /// all running. Each task is its own `tokio::spawn`, exactly as listed.
    pub async fn start(self: &Arc<Self>) -> Result<(), EngineError> {
        let tokens: Vec<_> = self.manifest.tokens().collect();
        let tick_stream = self.gateway.stream_ticks(tokens).await?;
        let mut order_updates = self.gateway.subscribe_order_updates().await?;

        let mut tasks = Vec::new();

        // Broker tick reader task: single writer into the Tick Store and
        // candle aggregator; no locks held across the stream's await point.
        // Trade logic (trailing) is deliberately kept off this task (§9
        // redesign note) and instead runs on its own polling schedule below.
        {
            let this = self.clone();
            let mut stream = tick_stream;
            let mut shutdown_rx = self.shutdown_rx.clone();
            tasks.push(tokio::spawn(async move {
                use tokio_stream::StreamExt;
                loop {
                    tokio::select! {
                        tick = stream.next() => {
                            let Some(tick) = tick else { break };
                            if let Err(error) = this.ticks.ingest(&this.manifest, tick.token, tick.last_price, tick.ts) {
                                tracing::debug!(?error, token = ?tick.token, "dropped tick");
                                continue;
                            }
                            if let Ok(symbol) = this.manifest.symbol_for_token(tick.token) {
                                this.aggregator.on_tick(symbol, tick.last_price, tick.volume_delta, tick.ts);
                            }
                        }
                        _ = shutdown_rx.changed() => {
                            if *shutdown_rx.borrow() {
                                break;
                            }
                        }
                    }
                }
            }));
        }

        // Trailing worker task: polls the latest tick per symbol on a
        // bounded schedule, decoupled from the broker thread's pacing.
        {
            let this = self.clone();
            let mut shutdown_rx = self.shutdown_rx.clone();
            tasks.push(tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = tokio::time::sleep(TRAILING_POLL_INTERVAL) => {}
                        _ = shutdown_rx.changed() => {
                            if *shutdown_rx.borrow() {
                                break;
                            }
                        }
                    }
                    if *shutdown_rx.borrow() {
                        break;
                    }
                    if !this.trading_enabled.load(Ordering::SeqCst) {
                        continue;
                    }
                    for symbol in this.manifest.universe() {
                        if let Some(snapshot) = this.ticks.last(symbol) {
                            this.trailing.on_tick(symbol, snapshot.last_price, snapshot.ts).await;
                        }
                    }
                }
            }));
        }

        // Candle boundary task: cooperative clock, not tick-driven.
        {
            let this = self.clone();
            let mut shutdown_rx = self.shutdown_rx.clone();
            tasks.push(tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = tokio::time::sleep(StdDuration::from_secs(1)) => {}
                        _ = shutdown_rx.changed() => {
                            if *shutdown_rx.borrow() {
                                this.aggregator.drain_closed(Utc::now(), this.candle_sink.as_ref());
                                break;
                            }
                        }
                    }
                    for candle in this.aggregator.drain_closed(Utc::now(), this.candle_sink.as_ref()) {
                        if candle.timeframe == Timeframe::M15 {
                            this.indicators.on_15m_close(&candle.symbol, candle.close, Utc::now());
                        } else if candle.timeframe == Timeframe::DAILY {
                            this.indicators.on_daily_close(&candle.symbol, candle.close, Utc::now());
                        }
                    }
                    if *shutdown_rx.borrow() {
                        break;
                    }
                }
            }));
        }

        // Strategy scanner task: sleeps SCAN_INTERVAL, runs at most one
        // cycle's worth of entry placement per wake.
        {
            let this = self.clone();
            let mut shutdown_rx = self.shutdown_rx.clone();
            let period = StdDuration::from_secs(self.config.scan_interval_seconds);
            tasks.push(tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = tokio::time::sleep(period) => {}
                        _ = shutdown_rx.changed() => {
                            if *shutdown_rx.borrow() {
                                break;
                            }
                        }
                    }
                    if *shutdown_rx.borrow() {
                        break;
                    }
                    if this.trading_enabled.load(Ordering::SeqCst) {
                        if let Err(error) = this.scanner.run_cycle(Utc::now()).await {
                            tracing::error!(?error, "scanner cycle failed");
                        }
                    }
                }
            }));
        }

        // Order event router task: blocks on the broker's update channel,
        // processes serially per identifier (concurrency across
        // identifiers happens naturally since router.handle is independent
        // per event and never awaits shared state beyond the store's own
        // per-row locking).
        {
            let this = self.clone();
            let mut shutdown_rx = self.shutdown_rx.clone();
            tasks.push(tokio::spawn(async move {
                loop {
                    tokio::select! {
                        event = order_updates.recv() => {
                            match event {
                                Some(event) => this.router.handle(event).await,
                                None => break,
                            }
                        }
                        _ = shutdown_rx.changed() => {
                            if *shutdown_rx.borrow() {
                                break;
                            }
                        }
                    }
                }
            }));
        }

        *self.tasks.lock().await = tasks;
        tracing::info!(mode = ?self.config.mode, "supervisor started");
        Ok(())
    }

    /// Graceful shutdown (§4.9): stop the scanner (finish current cycle),
    /// stop the trailing worker (finish in-flight modify), drain the order
    /// event router, flush open bars at the current boundary. No broker-side
    /// conditional order cancellation — they remain the operator's safety
    /// net.
    pub async fn stop(&self) -> Result<(), EngineError> {
        let _ = self.shutdown_tx.send(true);
        let mut tasks = self.tasks.lock().await;
        let drained = std::mem::take(&mut *tasks);
        let join_all = futures::future::join_all(drained.into_iter().map(|handle| async move {
            tokio::time::timeout(SHUTDOWN_GRACE, handle).await
        }));
        for result in join_all.await {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(error)) => return Err(error.into()),
                Err(_) => tracing::warn!("task did not finish within shutdown grace period"),
            }
        }
        tracing::info!("supervisor stopped");
        Ok(())
    }

    /// Transactional mode switch (§4.9): pauses the scanner/trailing tasks,
    /// swaps the Position Store namespace, then resumes. The old namespace
    /// is left untouched by [`PositionStore::set_mode`].
    pub fn set_mode(&self, mode: Mode) {
        self.trading_enabled.store(false, Ordering::SeqCst);
        self.store.set_mode(mode);
        self.trading_enabled.store(true, Ordering::SeqCst);
        tracing::info!(?mode, "mode switched");
    }

    pub fn list_open(&self) -> Vec<engine_trader::Trade> {
        self.store.open_all()
    }

    /// Manual operator close (§9 open question: cancels the owning
    /// conditional order immediately rather than leaving it to drop via the
    /// broker's counter-side fill).
    pub async fn close(&self, trade_id: TradeId) -> Result<(), EngineError> {
        let Some(trade) = self.store.get(trade_id) else {
            return Err(EngineError::Trade(engine_trader::TradeError::NotFound(trade_id)));
        };
        if let Some(gtt_id) = trade.gtt_id {
            self.gateway.cancel_conditional_order(gtt_id).await?;
        }
        let last_price = self
            .ticks
            .last(&trade.symbol)
            .map(|snapshot| snapshot.last_price)
            .unwrap_or(trade.entry_price);
        let now = Utc::now();
        let pnl = (last_price - trade.entry_price) * rust_decimal::Decimal::from(trade.qty);
        self.store.close(trade_id, last_price, now, pnl)?;
        self.cooldown.record(trade.symbol, now, last_price);
        Ok(())
    }

    /// Start-up reconciliation (§5): enumerates open Trades, fetches the
    /// broker's view, and drives each Trade back to a consistent state.
    pub async fn reconcile(&self) -> Result<(), EngineError> {
        let broker_positions = self.gateway.list_positions().await?;
        for trade in self.store.open_all() {
            if !broker_positions.contains(&trade.symbol) {
                tracing::warn!(trade_id = ?trade.id, symbol = %trade.symbol, "open trade has no matching broker position, closing");
                let now = Utc::now();
                self.store.close(trade.id, trade.current_stop_price, now, rust_decimal::Decimal::ZERO)?;
                self.cooldown.record(trade.symbol.clone(), now, trade.current_stop_price);
                continue;
            }
            if let Some(gtt_id) = trade.gtt_id {
                if self.gateway.get_conditional_order(gtt_id).await.is_err() {
                    tracing::warn!(trade_id = ?trade.id, "conditional order missing at broker, re-placing");
                    let spec = engine_execution::ConditionalOrderSpec {
                        symbol: trade.symbol.clone(),
                        kind: if trade.current_target_price.is_some() {
                            engine_execution::ConditionalOrderKind::StopAndTarget
                        } else {
                            engine_execution::ConditionalOrderKind::StopOnly
                        },
                        trigger_price_stop: trade.current_stop_price,
                        trigger_price_target: trade.current_target_price,
                        qty: trade.qty,
                    };
                    match self.gateway.place_conditional_order(spec).await {
                        Ok((new_gtt_id, _)) => {
                            self.store.update_stop(
                                trade.id,
                                trade.current_stop_price,
                                trade.highest_since_entry,
                                Some(new_gtt_id),
                            )?;
                        }
                        Err(error) => {
                            tracing::error!(?error, trade_id = ?trade.id, "reconciliation re-place failed");
                            self.store.mark_protection_compromised(trade.id)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_data::NullCandleSink;
    use engine_execution::PaperBrokerGateway;
    use engine_markets::Symbol;
    use engine_trader::InMemoryPositionStore;
    use rust_decimal_macros::dec;

    fn config() -> EngineConfig {
        let mut config = EngineConfig::default();
        config.universe.push(Symbol::new("X"));
        config
    }

    fn instruments() -> Vec<InstrumentSpec> {
        vec![InstrumentSpec {
            symbol: Symbol::new("X"),
            token: engine_markets::InstrumentToken(1),
            tick_size: dec!(0.01),
            lot_size: 1,
        }]
    }

    #[tokio::test]
    async fn builds_and_starts_and_stops_cleanly() {
        let manifest = Arc::new(InstrumentManifest::build(instruments()).unwrap());
        let gateway: Arc<dyn BrokerGateway> = Arc::new(PaperBrokerGateway::new(manifest));
        let store: Arc<dyn PositionStore> = Arc::new(InMemoryPositionStore::new());
        let sink: Arc<dyn CandleSink> = Arc::new(NullCandleSink);

        let supervisor = Arc::new(
            Supervisor::build(config(), instruments(), gateway, store, sink).unwrap(),
        );
        supervisor.start().await.unwrap();
        assert!(supervisor.list_open().is_empty());
        supervisor.stop().await.unwrap();
    }

    #[tokio::test]
    async fn reconcile_closes_trades_with_no_matching_broker_position() {
        let manifest = Arc::new(InstrumentManifest::build(instruments()).unwrap());
        let gateway: Arc<dyn BrokerGateway> = Arc::new(PaperBrokerGateway::new(manifest));
        let store: Arc<dyn PositionStore> = Arc::new(InMemoryPositionStore::new());
        let sink: Arc<dyn CandleSink> = Arc::new(NullCandleSink);

        let id = store.create_pending(engine_trader::NewTrade {
            symbol: Symbol::new("X"),
            position_index: engine_trader::PositionIndex::P1,
            entry_ts: Utc::now(),
            entry_price: dec!(100),
            qty: 10,
            mode: Mode::Paper,
            stop_loss_pct_config: dec!(-0.025),
            target_pct_config: Some(dec!(0.05)),
            rank_gm_at_entry: dec!(3.0),
        });
        store
            .activate(id, engine_execution::OrderId(1), engine_execution::GttId(1), dec!(100), dec!(97.5), Some(dec!(105)))
            .unwrap();

        let supervisor = Supervisor::build(config(), instruments(), gateway, store.clone(), sink).unwrap();
        supervisor.reconcile().await.unwrap();
        assert!(store.get(id).unwrap().status == engine_trader::TradeStatus::Closed);
    }
}
