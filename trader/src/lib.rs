#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    unused_extern_crates,
    clippy::unused_self,
    clippy::useless_let_if_seq,
    missing_debug_implementations,
    rust_2018_idioms
)]
#![allow(clippy::type_complexity, clippy::too_many_arguments)]

//! # Trader — Trade, Position Store, Order Event Router
//!
//! The position lifecycle's durable state and its sole mutator from broker
//! callbacks. See [`store::PositionStore`] for the entity contract and
//! [`router::OrderEventRouter`] for how broker order/conditional-order
//! events become lifecycle transitions.

pub mod error;
pub mod ids;
pub mod router;
pub mod store;
pub mod trade;

pub use error::TradeError;
pub use ids::TradeId;
pub use router::{FillObserver, OrderEventRouter};
pub use store::{InMemoryPositionStore, PositionStore};
pub use trade::{Mode, NewTrade, PositionIndex, Trade, TradeStatus};
