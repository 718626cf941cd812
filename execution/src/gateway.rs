//! `BrokerGateway`: the narrow capability set the rest of the engine drives
//! a broker through (§4.1). One concrete implementation ships here
//! ([`crate::paper::PaperBrokerGateway`]); a real broker adapter is an
//! external collaborator that implements the same trait.

use crate::{
    conditional::ConditionalOrderSpec,
    credentials::Credentials,
    error::BrokerError,
    ids::{GttId, OrderId},
    order_update::OrderUpdateEvent,
};
use async_trait::async_trait;
use engine_data::Tick;
use engine_markets::{InstrumentToken, Side, Symbol};
use rust_decimal::Decimal;
use std::pin::Pin;
use tokio_stream::Stream;

pub type TickStream = Pin<Box<dyn Stream<Item = Tick> + Send>>;

#[async_trait]
pub trait BrokerGateway: Send + Sync {
    async fn authenticate(&self, creds: &Credentials) -> Result<(), BrokerError>;

    /// Lazy, infinite tick sequence. Implementations reconnect on their own
    /// with exponential backoff (cap 30s); on resubscription the full token
    /// set is re-sent.
    async fn stream_ticks(&self, tokens: Vec<InstrumentToken>) -> Result<TickStream, BrokerError>;

    async fn place_market_order(
        &self,
        symbol: &Symbol,
        side: Side,
        qty: u64,
    ) -> Result<OrderId, BrokerError>;

    /// Trigger prices are rounded to the instrument's tick size before
    /// submission; the rounded value is returned to the caller.
    async fn place_conditional_order(
        &self,
        spec: ConditionalOrderSpec,
    ) -> Result<(GttId, ConditionalOrderSpec), BrokerError>;

    /// Preferred path for trailing a stop; must be idempotent on
    /// `(gtt_id, new_spec)`. On any non-success the caller falls back to
    /// cancel+place.
    async fn modify_conditional_order(
        &self,
        gtt_id: GttId,
        new_spec: ConditionalOrderSpec,
    ) -> Result<(), BrokerError>;

    /// Idempotent; "not found" is treated as success.
    async fn cancel_conditional_order(&self, gtt_id: GttId) -> Result<(), BrokerError>;

    /// Read-back of a conditional order's current trigger prices, used by
    /// the trailing worker to verify a modify/replace actually landed.
    async fn get_conditional_order(
        &self,
        gtt_id: GttId,
    ) -> Result<crate::conditional::ConditionalOrder, BrokerError>;

    async fn list_orders(&self) -> Result<Vec<OrderId>, BrokerError>;

    async fn list_positions(&self) -> Result<Vec<Symbol>, BrokerError>;

    /// At-least-once delivery; consumers must dedupe on
    /// `(identifier, status, exch_ts)`.
    async fn subscribe_order_updates(
        &self,
    ) -> Result<tokio::sync::mpsc::UnboundedReceiver<OrderUpdateEvent>, BrokerError>;
}

/// Rounds `price` to the nearest multiple of `tick_size`. A zero tick size
/// (misconfigured instrument) leaves the price untouched rather than
/// dividing by zero.
pub fn round_to_tick(price: Decimal, tick_size: Decimal) -> Decimal {
    if tick_size.is_zero() {
        return price;
    }
    (price / tick_size).round() * tick_size
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rounds_to_nearest_tick() {
        assert_eq!(round_to_tick(dec!(100.432), dec!(0.01)), dec!(100.43));
        assert_eq!(round_to_tick(dec!(100.436), dec!(0.01)), dec!(100.44));
    }

    #[test]
    fn zero_tick_size_is_a_no_op() {
        assert_eq!(round_to_tick(dec!(100.432), dec!(0)), dec!(100.432));
    }
}
