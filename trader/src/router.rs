//! Order Event Router (§4.8): the single consumer of broker order and
//! conditional-order updates, dispatching them into Position Store
//! transitions.

use crate::store::PositionStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use engine_execution::{
    BrokerGateway, ConditionalOrderKind, ConditionalOrderSpec, OrderId, OrderUpdateEvent,
    OrderUpdateIdentifier, OrderUpdateStatus,
};
use engine_risk::CooldownRegistry;
use indexmap::IndexSet;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Minimum bounded-LRU capacity the router's dedupe set must hold (§4.8).
pub const DEDUPE_CAPACITY: usize = 1000;

/// The entry placement protocol's remaining steps (§4.5 steps 3-5) live with
/// whoever placed the order, not the router — the Position Store has no
/// `byOrderId` entry for a Trade until `activate` runs, so the router cannot
/// resolve a fill to a Trade on its own. The scanner implements this to drive
/// its own `pending_orders` bookkeeping from the fill the router observes.
#[async_trait]
pub trait FillObserver: Send + Sync {
    async fn on_fill(&self, order_id: OrderId, price: Decimal, exch_ts: DateTime<Utc>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct DedupeKey {
    identifier: OrderUpdateIdentifier,
    status_kind: &'static str,
    exch_ts: DateTime<Utc>,
}

pub struct OrderEventRouter {
    store: Arc<dyn PositionStore>,
    cooldown: Arc<CooldownRegistry>,
    gateway: Arc<dyn BrokerGateway>,
    fill_observer: Arc<dyn FillObserver>,
    seen: Mutex<IndexSet<DedupeKey>>,
}

impl OrderEventRouter {
    pub fn new(
        store: Arc<dyn PositionStore>,
        cooldown: Arc<CooldownRegistry>,
        gateway: Arc<dyn BrokerGateway>,
        fill_observer: Arc<dyn FillObserver>,
    ) -> Self {
        Self {
            store,
            cooldown,
            gateway,
            fill_observer,
            seen: Mutex::new(IndexSet::new()),
        }
    }

    /// `true` if this exact `(identifier, status kind, exchTs)` triple has
    /// already been dispatched. Oldest entries are evicted FIFO once the
    /// dedupe window exceeds [`DEDUPE_CAPACITY`] — duplicate redelivery
    /// happens close together in practice, so FIFO eviction gives the same
    /// outcome as a true LRU for this workload.
    fn already_dispatched(&self, key: DedupeKey) -> bool {
        let mut seen = self.seen.lock();
        if !seen.insert(key) {
            return true;
        }
        if seen.len() > DEDUPE_CAPACITY {
            seen.shift_remove_index(0);
        }
        false
    }

    pub async fn handle(&self, event: OrderUpdateEvent) {
        let key = DedupeKey {
            identifier: event.identifier,
            status_kind: event.status.kind(),
            exch_ts: event.exch_ts,
        };
        if self.already_dispatched(key) {
            tracing::debug!(identifier = ?event.identifier, "duplicate order update, ignoring");
            return;
        }

        match (event.identifier, event.status) {
            (OrderUpdateIdentifier::Order(order_id), OrderUpdateStatus::Filled { price, .. }) => {
                self.fill_observer.on_fill(order_id, price, event.exch_ts).await;
            }
            (
                OrderUpdateIdentifier::Gtt(gtt_id),
                OrderUpdateStatus::ConditionalTriggered { price },
            ) => {
                self.on_conditional_triggered(gtt_id, price, event.exch_ts).await;
            }
            (
                OrderUpdateIdentifier::Gtt(gtt_id),
                OrderUpdateStatus::ConditionalCancelled
                | OrderUpdateStatus::ConditionalFailed { .. }
                | OrderUpdateStatus::ConditionalStale,
            ) => {
                self.on_conditional_lost(gtt_id).await;
            }
            _ => {
                tracing::warn!(identifier = ?event.identifier, "unknown order update identifier, dropping");
            }
        }
    }

    async fn on_conditional_triggered(
        &self,
        gtt_id: engine_execution::GttId,
        price: rust_decimal::Decimal,
        exch_ts: DateTime<Utc>,
    ) {
        let Some(trade) = self.store.by_gtt_id(gtt_id) else {
            tracing::warn!(?gtt_id, "trigger for unknown gtt id, dropping");
            return;
        };
        if !trade.is_open() {
            return;
        }

        let pnl = (price - trade.entry_price) * rust_decimal::Decimal::from(trade.qty);

        if let Err(error) = self.store.close(trade.id, price, exch_ts, pnl) {
            tracing::error!(?error, trade_id = ?trade.id, "failed to close triggered trade");
            return;
        }
        self.cooldown
            .record(trade.symbol.clone(), exch_ts, price);
    }

    async fn on_conditional_lost(&self, gtt_id: engine_execution::GttId) {
        let Some(trade) = self.store.by_gtt_id(gtt_id) else {
            tracing::warn!(?gtt_id, "cancellation for unknown gtt id, dropping");
            return;
        };
        if !trade.is_open() {
            return;
        }

        let spec = ConditionalOrderSpec {
            symbol: trade.symbol.clone(),
            kind: if trade.current_target_price.is_some() {
                ConditionalOrderKind::StopAndTarget
            } else {
                ConditionalOrderKind::StopOnly
            },
            trigger_price_stop: trade.current_stop_price,
            trigger_price_target: trade.current_target_price,
            qty: trade.qty,
        };

        match self.gateway.place_conditional_order(spec).await {
            Ok((new_gtt_id, _)) => {
                if let Err(error) = self.store.update_stop(
                    trade.id,
                    trade.current_stop_price,
                    trade.highest_since_entry,
                    Some(new_gtt_id),
                ) {
                    tracing::error!(?error, trade_id = ?trade.id, "failed to record re-placed gtt");
                }
            }
            Err(error) => {
                tracing::error!(?error, trade_id = ?trade.id, "re-place failed after protection loss");
                if let Err(error) = self.store.mark_protection_compromised(trade.id) {
                    tracing::error!(?error, trade_id = ?trade.id, "failed to mark protection compromised");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryPositionStore;
    use engine_execution::PaperBrokerGateway;
    use engine_markets::{InstrumentManifest, InstrumentSpec, Symbol};
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    struct RecordingObserver {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl FillObserver for RecordingObserver {
        async fn on_fill(&self, _order_id: OrderId, _price: Decimal, _exch_ts: DateTime<Utc>) {
            self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        }
    }

    fn manifest() -> Arc<InstrumentManifest> {
        Arc::new(
            InstrumentManifest::build([InstrumentSpec {
                symbol: Symbol::new("X"),
                token: engine_markets::InstrumentToken(1),
                tick_size: dec!(0.01),
                lot_size: 1,
            }])
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn filled_order_event_reaches_the_fill_observer() {
        let store: Arc<dyn PositionStore> = Arc::new(InMemoryPositionStore::new());
        let cooldown = Arc::new(CooldownRegistry::new());
        let gateway: Arc<dyn BrokerGateway> = Arc::new(PaperBrokerGateway::new(manifest()));
        let observer = Arc::new(RecordingObserver { calls: AtomicUsize::new(0) });
        let router = OrderEventRouter::new(store, cooldown, gateway, observer.clone());

        router
            .handle(OrderUpdateEvent {
                identifier: OrderUpdateIdentifier::Order(OrderId(1)),
                status: OrderUpdateStatus::Filled { price: dec!(103.00), qty: 29 },
                exch_ts: Utc::now(),
            })
            .await;

        assert_eq!(observer.calls.load(AtomicOrdering::SeqCst), 1);
    }
}
