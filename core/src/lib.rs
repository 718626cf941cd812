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

//! # Core — Lifecycle Supervisor
//!
//! Loads configuration and the symbol universe, resolves broker tokens,
//! constructs every other component in dependency order, and owns the
//! concurrent tasks that bind the tick pipeline, the strategy scanner, the
//! trailing worker, and the order event router together (§4.9, §5).
//!
//! This crate is deliberately thin: the hard engineering lives in
//! `engine-data` (tick/candle), `engine-analytics` (indicators),
//! `engine-trader` (positions), `engine-strategies` (scanner/trailing),
//! `engine-risk` (cooldown), and `engine-execution` (broker gateway). `core`
//! wires them together and carries the ambient configuration, error
//! aggregation, and logging setup a complete binary needs.

pub mod config;
pub mod error;
pub mod logging;
pub mod shutdown;
pub mod supervisor;

pub use config::EngineConfig;
pub use error::EngineError;
pub use supervisor::Supervisor;
