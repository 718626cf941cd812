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

//! # Risk — Cooldown Registry
//!
//! The scanner's re-entry guard: a per-symbol cooldown window following an
//! exit, plus the anti-flip price-proximity check layered on top of it. Both
//! are read by the strategy scanner before scheduling a fresh entry and
//! written by the order event router when a Trade closes.

pub mod anti_flip;
pub mod cooldown;

pub use anti_flip::{passes_anti_flip, ANTI_FLIP_MULTIPLIER};
pub use cooldown::{CooldownEntry, CooldownRegistry, CooldownStatus};
