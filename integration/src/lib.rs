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

//! # Integration
//!
//! Small, dependency-light primitives shared across the engine's network
//! boundaries. Currently just the reconnect/backoff policy the broker
//! gateway uses for its streaming and RPC paths.

pub mod backoff;

pub use backoff::ExponentialBackoff;
