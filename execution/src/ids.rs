//! Broker-assigned identifiers.

use derive_more::{Constructor, Display, From};
use serde::{Deserialize, Serialize};

/// Identity of a market order, assigned by the broker on placement.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, From, Constructor, Serialize, Deserialize,
)]
pub struct OrderId(pub i64);

/// Identity of a conditional ("GTT") order, assigned by the broker on placement.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, From, Constructor, Serialize, Deserialize,
)]
pub struct GttId(pub i64);
