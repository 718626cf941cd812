//! Candle timeframes. At minimum a 15-minute bar is configured (§4.2).

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timeframe {
    seconds: i64,
}

impl Timeframe {
    pub const fn from_minutes(minutes: i64) -> Self {
        Self {
            seconds: minutes * 60,
        }
    }

    pub const M15: Timeframe = Timeframe::from_minutes(15);
    pub const DAILY: Timeframe = Timeframe::from_minutes(60 * 24);

    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    /// `floor(ts, timeframe)`: the start of the bar `ts` belongs to. A tick
    /// exactly on a boundary belongs to the bar it opens, not the one it closes.
    pub fn bar_start(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let epoch_secs = ts.timestamp();
        let floored = epoch_secs.div_euclid(self.seconds) * self.seconds;
        Utc.timestamp_opt(floored, 0).single().expect("in range")
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.seconds % 60 == 0 && self.seconds < 3600 {
            write!(f, "{}m", self.seconds / 60)
        } else if self.seconds % 3600 == 0 {
            write!(f, "{}h", self.seconds / 3600)
        } else {
            write!(f, "{}s", self.seconds)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn bar_start_floors_to_boundary() {
        let tf = Timeframe::M15;
        let ts = Utc.with_ymd_and_hms(2026, 7, 31, 9, 37, 12).unwrap();
        let start = tf.bar_start(ts);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 7, 31, 9, 30, 0).unwrap());
    }

    #[test]
    fn tick_exactly_on_boundary_opens_new_bar() {
        let tf = Timeframe::M15;
        let ts = Utc.with_ymd_and_hms(2026, 7, 31, 9, 30, 0).unwrap();
        assert_eq!(tf.bar_start(ts), ts);
    }
}
