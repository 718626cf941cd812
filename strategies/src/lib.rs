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

//! # Strategies — Momentum Ladder
//!
//! The two cooperating halves of the position lifecycle's decision layer:
//! [`scanner::Scanner`] (entry ranking, ladder reconciliation, fresh-entry
//! placement) and [`trailing::TrailingWorker`] (per-tick stop trailing).
//! Both are driven externally by a clock/tick source; neither owns a task
//! loop itself.

pub mod config;
pub mod error;
pub mod policy;
pub mod scanner;
pub mod trailing;

pub use config::ScannerConfig;
pub use error::StrategyError;
pub use policy::{LadderGate, PositionPolicy};
pub use scanner::Scanner;
pub use trailing::TrailingWorker;
