//! Conditional ("GTT") orders: the broker-side stop/target legs that protect
//! an open Trade (§3, §4.1).

use crate::ids::GttId;
use engine_markets::Symbol;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionalOrderKind {
    /// P2/P3: a single protective stop, no target leg.
    StopOnly,
    /// P1: a two-leg one-cancels-other stop + target.
    StopAndTarget,
}

/// Caller-supplied specification for a (re)placement; trigger prices are
/// rounded to the instrument's tick size by the gateway before submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalOrderSpec {
    pub symbol: Symbol,
    pub kind: ConditionalOrderKind,
    pub trigger_price_stop: Decimal,
    pub trigger_price_target: Option<Decimal>,
    pub qty: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionalOrderStatus {
    Active,
    Triggered,
    Cancelled,
    Stale,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalOrder {
    pub gtt_id: GttId,
    pub symbol: Symbol,
    pub kind: ConditionalOrderKind,
    pub trigger_price_stop: Decimal,
    pub trigger_price_target: Option<Decimal>,
    pub qty: u64,
    pub status: ConditionalOrderStatus,
}
