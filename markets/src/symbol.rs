//! Canonical symbol identity and the broker's integer instrument token.
//!
//! Every component keys its lookups on [`Symbol`]; the broker gateway and
//! tick stream key on [`InstrumentToken`]. The mapping between the two is
//! loaded once at startup (see [`crate::manifest::InstrumentManifest`]) and is
//! immutable for the process lifetime, per the data model's invariants.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque textual identifier for a tradable equity (e.g. tradingsymbol).
///
/// Construction always normalizes to the canonical form (trimmed, uppercased)
/// so that two differently-cased spellings of the same symbol hash and
/// compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Symbol {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Integer key the broker uses for tick subscription and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstrumentToken(pub i64);

impl fmt::Display for InstrumentToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_normalizes_case_and_whitespace() {
        assert_eq!(Symbol::new(" reliance "), Symbol::new("RELIANCE"));
        assert_eq!(Symbol::new("reliance").as_str(), "RELIANCE");
    }
}
