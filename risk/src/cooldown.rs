//! Per-symbol cooldown registry (§4.7).
//!
//! Process-local, memory-only: entries never survive a restart. Read by both
//! the scanner (fresh-entry gate) and the order event router (written on
//! Trade close).

use chrono::{DateTime, Duration, Utc};
use derive_more::Constructor;
use engine_markets::Symbol;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Snapshot of a symbol's most recent exit.
#[derive(Debug, Clone, Copy, PartialEq, Constructor)]
pub struct CooldownEntry {
    pub last_exit_ts: DateTime<Utc>,
    pub last_exit_price: Decimal,
}

/// Whether a re-entry is currently permitted, and how long until it is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CooldownStatus {
    pub allowed: bool,
    pub remaining: Option<Duration>,
}

/// `symbol -> CooldownEntry` guarded by a single exclusive lock; every
/// operation is O(1).
#[derive(Debug, Default)]
pub struct CooldownRegistry {
    entries: Mutex<HashMap<Symbol, CooldownEntry>>,
}

impl CooldownRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an exit, starting the cooldown window from `now`.
    pub fn record(&self, symbol: Symbol, now: DateTime<Utc>, exit_price: Decimal) {
        self.entries
            .lock()
            .insert(symbol, CooldownEntry::new(now, exit_price));
    }

    /// Current entry for `symbol`, if any exit has ever been recorded.
    pub fn entry(&self, symbol: &Symbol) -> Option<CooldownEntry> {
        self.entries.lock().get(symbol).copied()
    }

    /// `false` until `lastExitTs + cooldownSeconds <= now`. A symbol with no
    /// recorded exit is always allowed.
    pub fn is_allowed(
        &self,
        symbol: &Symbol,
        now: DateTime<Utc>,
        cooldown_seconds: i64,
    ) -> CooldownStatus {
        match self.entry(symbol) {
            None => CooldownStatus {
                allowed: true,
                remaining: None,
            },
            Some(entry) => {
                let unlocks_at = entry.last_exit_ts + Duration::seconds(cooldown_seconds);
                if now >= unlocks_at {
                    CooldownStatus {
                        allowed: true,
                        remaining: None,
                    }
                } else {
                    CooldownStatus {
                        allowed: false,
                        remaining: Some(unlocks_at - now),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn t(offset_secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 31, 10, 0, 0).unwrap() + Duration::seconds(offset_secs)
    }

    #[test]
    fn symbol_with_no_exit_is_always_allowed() {
        let registry = CooldownRegistry::new();
        let status = registry.is_allowed(&Symbol::new("X"), t(0), 180);
        assert!(status.allowed);
        assert_eq!(status.remaining, None);
    }

    #[test]
    fn blocks_until_cooldown_elapses_then_allows() {
        let registry = CooldownRegistry::new();
        let symbol = Symbol::new("Y");
        registry.record(symbol.clone(), t(0), dec!(48.75));

        let blocked = registry.is_allowed(&symbol, t(60), 180);
        assert!(!blocked.allowed);
        assert_eq!(blocked.remaining, Some(Duration::seconds(120)));

        let allowed = registry.is_allowed(&symbol, t(180), 180);
        assert!(allowed.allowed);
    }
}
