//! Asynchronous order/conditional-order transitions delivered by
//! `subscribe_order_updates` (§4.1). Delivery is at-least-once; the order
//! event router (in `engine-trader`) is the one responsible for deduping on
//! `(identifier, status, exch_ts)`.

use crate::ids::{GttId, OrderId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderUpdateIdentifier {
    Order(OrderId),
    Gtt(GttId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrderUpdateStatus {
    Filled { price: Decimal, qty: u64 },
    ConditionalTriggered { price: Decimal },
    ConditionalCancelled,
    ConditionalFailed { reason: String },
    ConditionalStale,
    Unknown,
}

impl OrderUpdateStatus {
    /// Variant tag, stripped of payload, for use as part of a dedupe key.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Filled { .. } => "filled",
            Self::ConditionalTriggered { .. } => "conditional_triggered",
            Self::ConditionalCancelled => "conditional_cancelled",
            Self::ConditionalFailed { .. } => "conditional_failed",
            Self::ConditionalStale => "conditional_stale",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderUpdateEvent {
    pub identifier: OrderUpdateIdentifier,
    pub status: OrderUpdateStatus,
    pub exch_ts: DateTime<Utc>,
}
