use derive_more::{Constructor, Display};
use serde::{Deserialize, Serialize};

/// Monotonic, store-assigned Trade identity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Constructor, Serialize, Deserialize,
)]
pub struct TradeId(pub u64);
