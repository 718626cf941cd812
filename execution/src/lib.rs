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

//! # Execution — Broker Gateway
//!
//! Abstracts a single external broker behind the narrow capability set the
//! rest of the engine drives it through: authenticate, stream ticks, place
//! market and conditional orders, and receive asynchronous order updates.
//! See [`gateway::BrokerGateway`] for the contract and [`paper`] for the
//! deterministic in-process implementation used by paper mode and tests.

pub mod conditional;
pub mod credentials;
pub mod error;
pub mod gateway;
pub mod ids;
pub mod order_update;
pub mod paper;

pub use conditional::{ConditionalOrder, ConditionalOrderKind, ConditionalOrderSpec, ConditionalOrderStatus};
pub use credentials::Credentials;
pub use error::BrokerError;
pub use gateway::{round_to_tick, BrokerGateway, TickStream};
pub use ids::{GttId, OrderId};
pub use order_update::{OrderUpdateEvent, OrderUpdateIdentifier, OrderUpdateStatus};
pub use paper::PaperBrokerGateway;
