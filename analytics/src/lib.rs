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

//! # Analytics — Indicator Cache & Rank_GM
//!
//! Rolling-window SMA/EMA/RSI calculators and the `Rank_GM` momentum score
//! that gates strategy entries. See [`cache::IndicatorCache`] for the
//! coherent per-symbol snapshot consumers read.

pub mod cache;
pub mod indicators;
pub mod rank;
pub mod snapshot;
pub mod window;

pub use cache::IndicatorCache;
pub use indicators::{Ema, Rsi};
pub use rank::{passes_entry_filter, rank_final, rank_gm};
pub use snapshot::{IndicatorSnapshot, SecondaryIndicators};
pub use window::RollingWindow;
