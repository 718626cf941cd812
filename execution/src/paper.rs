//! In-process deterministic fill simulator (§4.1 `[AMBIENT]`): fills market
//! orders immediately at the last known price, and tracks conditional orders
//! in memory without ever triggering them itself (triggering is left to a
//! driving test/demo via [`PaperBrokerGateway::push_tick`] plus whatever
//! consumes `subscribe_order_updates`). Used by the `paper` engine mode and
//! by integration tests.

use crate::{
    conditional::{ConditionalOrder, ConditionalOrderSpec, ConditionalOrderStatus},
    credentials::Credentials,
    error::BrokerError,
    gateway::{round_to_tick, BrokerGateway, TickStream},
    ids::{GttId, OrderId},
    order_update::{OrderUpdateEvent, OrderUpdateIdentifier, OrderUpdateStatus},
};
use async_trait::async_trait;
use chrono::Utc;
use engine_data::Tick;
use engine_markets::{InstrumentManifest, InstrumentToken, Side, Symbol};
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    },
};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

#[derive(Debug)]
pub struct PaperBrokerGateway {
    manifest: Arc<InstrumentManifest>,
    last_prices: RwLock<HashMap<Symbol, Decimal>>,
    conditional_orders: Mutex<HashMap<GttId, ConditionalOrder>>,
    order_seq: AtomicI64,
    gtt_seq: AtomicI64,
    tick_tx: Mutex<Option<mpsc::UnboundedSender<Tick>>>,
    update_tx: Mutex<Option<mpsc::UnboundedSender<OrderUpdateEvent>>>,
}

impl PaperBrokerGateway {
    pub fn new(manifest: Arc<InstrumentManifest>) -> Self {
        Self {
            manifest,
            last_prices: RwLock::new(HashMap::new()),
            conditional_orders: Mutex::new(HashMap::new()),
            order_seq: AtomicI64::new(1),
            gtt_seq: AtomicI64::new(1),
            tick_tx: Mutex::new(None),
            update_tx: Mutex::new(None),
        }
    }

    /// Feeds a tick into the simulator: updates the price used to fill
    /// market orders and forwards it to any active `stream_ticks` consumer.
    pub fn push_tick(&self, tick: Tick) {
        if let Ok(symbol) = self.manifest.symbol_for_token(tick.token) {
            self.last_prices
                .write()
                .insert(symbol.clone(), tick.last_price);
        }
        if let Some(tx) = self.tick_tx.lock().as_ref() {
            let _ = tx.send(tick);
        }
    }

    pub fn conditional_order(&self, gtt_id: GttId) -> Option<ConditionalOrder> {
        self.conditional_orders.lock().get(&gtt_id).cloned()
    }
}

#[async_trait]
impl BrokerGateway for PaperBrokerGateway {
    async fn authenticate(&self, _creds: &Credentials) -> Result<(), BrokerError> {
        Ok(())
    }

    async fn stream_ticks(&self, _tokens: Vec<InstrumentToken>) -> Result<TickStream, BrokerError> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.tick_tx.lock() = Some(tx);
        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }

    async fn place_market_order(
        &self,
        symbol: &Symbol,
        _side: Side,
        _qty: u64,
    ) -> Result<OrderId, BrokerError> {
        let price = self
            .last_prices
            .read()
            .get(symbol)
            .copied()
            .ok_or_else(|| BrokerError::unavailable("no market data for symbol"))?;

        let order_id = OrderId(self.order_seq.fetch_add(1, Ordering::SeqCst));
        if let Some(tx) = self.update_tx.lock().as_ref() {
            let _ = tx.send(OrderUpdateEvent {
                identifier: OrderUpdateIdentifier::Order(order_id),
                status: OrderUpdateStatus::Filled {
                    price,
                    qty: _qty,
                },
                exch_ts: Utc::now(),
            });
        }
        Ok(order_id)
    }

    async fn place_conditional_order(
        &self,
        spec: ConditionalOrderSpec,
    ) -> Result<(GttId, ConditionalOrderSpec), BrokerError> {
        let tick_size = self
            .manifest
            .spec(&spec.symbol)
            .map(|instrument| instrument.tick_size)
            .unwrap_or(Decimal::ZERO);

        let rounded = ConditionalOrderSpec {
            trigger_price_stop: round_to_tick(spec.trigger_price_stop, tick_size),
            trigger_price_target: spec
                .trigger_price_target
                .map(|target| round_to_tick(target, tick_size)),
            ..spec
        };

        let gtt_id = GttId(self.gtt_seq.fetch_add(1, Ordering::SeqCst));
        self.conditional_orders.lock().insert(
            gtt_id,
            ConditionalOrder {
                gtt_id,
                symbol: rounded.symbol.clone(),
                kind: rounded.kind,
                trigger_price_stop: rounded.trigger_price_stop,
                trigger_price_target: rounded.trigger_price_target,
                qty: rounded.qty,
                status: ConditionalOrderStatus::Active,
            },
        );
        Ok((gtt_id, rounded))
    }

    async fn modify_conditional_order(
        &self,
        gtt_id: GttId,
        new_spec: ConditionalOrderSpec,
    ) -> Result<(), BrokerError> {
        let tick_size = self
            .manifest
            .spec(&new_spec.symbol)
            .map(|instrument| instrument.tick_size)
            .unwrap_or(Decimal::ZERO);

        let mut guard = self.conditional_orders.lock();
        let order = guard
            .get_mut(&gtt_id)
            .ok_or_else(|| BrokerError::rejected("gtt not found"))?;
        order.trigger_price_stop = round_to_tick(new_spec.trigger_price_stop, tick_size);
        order.trigger_price_target = new_spec
            .trigger_price_target
            .map(|target| round_to_tick(target, tick_size));
        Ok(())
    }

    async fn cancel_conditional_order(&self, gtt_id: GttId) -> Result<(), BrokerError> {
        self.conditional_orders.lock().remove(&gtt_id);
        Ok(())
    }

    async fn get_conditional_order(&self, gtt_id: GttId) -> Result<ConditionalOrder, BrokerError> {
        self.conditional_orders
            .lock()
            .get(&gtt_id)
            .cloned()
            .ok_or_else(|| BrokerError::rejected("gtt not found"))
    }

    async fn list_orders(&self) -> Result<Vec<OrderId>, BrokerError> {
        Ok(Vec::new())
    }

    async fn list_positions(&self) -> Result<Vec<Symbol>, BrokerError> {
        Ok(self.last_prices.read().keys().cloned().collect())
    }

    async fn subscribe_order_updates(
        &self,
    ) -> Result<mpsc::UnboundedReceiver<OrderUpdateEvent>, BrokerError> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.update_tx.lock() = Some(tx);
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_markets::InstrumentManifest;
    use rust_decimal_macros::dec;

    fn manifest() -> Arc<InstrumentManifest> {
        Arc::new(
            InstrumentManifest::build(vec![engine_markets::InstrumentSpec {
                symbol: Symbol::new("PETR4"),
                token: InstrumentToken(1),
                tick_size: dec!(0.01),
                lot_size: 100,
            }])
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn market_order_fails_without_a_price() {
        let gateway = PaperBrokerGateway::new(manifest());
        let err = gateway
            .place_market_order(&Symbol::new("PETR4"), Side::Buy, 100)
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn market_order_fills_at_last_price() {
        let gateway = PaperBrokerGateway::new(manifest());
        gateway.push_tick(Tick {
            token: InstrumentToken(1),
            last_price: dec!(103.00),
            ts: Utc::now(),
            volume_delta: 0,
        });

        let order_id = gateway
            .place_market_order(&Symbol::new("PETR4"), Side::Buy, 100)
            .await
            .unwrap();
        assert_eq!(order_id, OrderId(1));
    }

    #[tokio::test]
    async fn conditional_order_rounds_to_tick_size() {
        let gateway = PaperBrokerGateway::new(manifest());
        let (gtt_id, rounded) = gateway
            .place_conditional_order(ConditionalOrderSpec {
                symbol: Symbol::new("PETR4"),
                kind: crate::conditional::ConditionalOrderKind::StopOnly,
                trigger_price_stop: dec!(100.436),
                trigger_price_target: None,
                qty: 100,
            })
            .await
            .unwrap();
        assert_eq!(rounded.trigger_price_stop, dec!(100.44));
        assert_eq!(gateway.conditional_order(gtt_id).unwrap().status, crate::conditional::ConditionalOrderStatus::Active);
    }

    #[tokio::test]
    async fn cancel_on_already_cancelled_gtt_succeeds() {
        let gateway = PaperBrokerGateway::new(manifest());
        gateway.cancel_conditional_order(GttId(999)).await.unwrap();
    }
}
