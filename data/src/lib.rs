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

//! # Data — Tick Store & Candle Aggregator
//!
//! Single-writer/many-reader tick ingestion and per-symbol OHLCV candle
//! accumulation with boundary-triggered emission to a persistence
//! collaborator. See `engine-analytics` for the indicators computed on top
//! of these candles.

pub mod aggregator;
pub mod candle;
pub mod error;
pub mod tick;
pub mod tick_store;
pub mod timeframe;

pub use aggregator::{CandleAggregator, CandleSink, NullCandleSink};
pub use candle::Candle;
pub use error::DataError;
pub use tick::{Tick, TickSnapshot};
pub use tick_store::TickStore;
pub use timeframe::Timeframe;
