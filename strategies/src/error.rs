//! Errors raised while scanning for entries or trailing an open Trade.

use engine_execution::BrokerError;
use engine_trader::TradeError;

#[derive(Debug, thiserror::Error)]
pub enum StrategyError {
    #[error("sizing produced a zero quantity for {symbol} at price {price}")]
    InsufficientNotional {
        symbol: engine_markets::Symbol,
        price: rust_decimal::Decimal,
    },

    #[error("broker error: {0}")]
    Broker(#[from] BrokerError),

    #[error("position store error: {0}")]
    Store(#[from] TradeError),
}
