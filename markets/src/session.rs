//! Trading session window used by the strategy scanner's clock gate (§4.5.1).

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Local trading session window, e.g. `[09:30, 15:30]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Default for SessionWindow {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(9, 30, 0).expect("valid time"),
            end: NaiveTime::from_hms_opt(15, 30, 0).expect("valid time"),
        }
    }
}

impl SessionWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Whether `local_time` falls within `[start, end]` inclusive.
    pub fn contains(&self, local_time: NaiveTime) -> bool {
        local_time >= self.start && local_time <= self.end
    }

    /// True for the first in-session tick of the day: `local_time` is within
    /// one scanner period (`period_secs`) of session open.
    pub fn is_session_open(&self, local_time: NaiveTime, period_secs: u32) -> bool {
        let secs_since_open = local_time.num_seconds_from_midnight() as i64
            - self.start.num_seconds_from_midnight() as i64;
        (0..period_secs as i64).contains(&secs_since_open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_inclusive() {
        let window = SessionWindow::default();
        assert!(window.contains(NaiveTime::from_hms_opt(9, 30, 0).unwrap()));
        assert!(window.contains(NaiveTime::from_hms_opt(15, 30, 0).unwrap()));
        assert!(!window.contains(NaiveTime::from_hms_opt(9, 29, 59).unwrap()));
        assert!(!window.contains(NaiveTime::from_hms_opt(15, 30, 1).unwrap()));
    }

    #[test]
    fn detects_first_tick_of_day() {
        let window = SessionWindow::default();
        assert!(window.is_session_open(NaiveTime::from_hms_opt(9, 30, 10).unwrap(), 60));
        assert!(!window.is_session_open(NaiveTime::from_hms_opt(9, 31, 10).unwrap(), 60));
    }
}
