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

//! # Markets
//!
//! Symbol identity, the broker's instrument token mapping, and the trading
//! session calendar shared by every other crate in the engine. Deliberately
//! narrow: this crate carries no exchange-specific or asset-class machinery,
//! since the engine trades a single fixed equities universe on one venue.

pub mod manifest;
pub mod session;
pub mod side;
pub mod symbol;

pub use manifest::{InstrumentManifest, InstrumentSpec, ManifestError};
pub use session::SessionWindow;
pub use side::Side;
pub use symbol::{InstrumentToken, Symbol};
