//! Instrument manifest: the immutable Symbol ↔ InstrumentToken mapping plus
//! per-instrument trading parameters (tick size, lot size) loaded at startup.

use crate::symbol::{InstrumentToken, Symbol};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Static per-instrument trading parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSpec {
    pub symbol: Symbol,
    pub token: InstrumentToken,
    /// Minimum price increment the broker accepts.
    pub tick_size: rust_decimal::Decimal,
    /// Order quantities must be a multiple of this.
    pub lot_size: u64,
}

#[derive(Debug, Clone, thiserror::Error, Eq, PartialEq)]
pub enum ManifestError {
    #[error("duplicate symbol in instrument manifest: {0}")]
    DuplicateSymbol(Symbol),
    #[error("duplicate token in instrument manifest: {0}")]
    DuplicateToken(InstrumentToken),
    #[error("unknown symbol: {0}")]
    UnknownSymbol(Symbol),
    #[error("unknown token: {0}")]
    UnknownToken(InstrumentToken),
}

/// Immutable Symbol ↔ InstrumentToken mapping, resolved once at startup.
///
/// Held behind an `Arc` by every component that needs to translate between
/// the two identity spaces; never mutated after [`InstrumentManifest::build`].
#[derive(Debug, Clone)]
pub struct InstrumentManifest {
    by_symbol: HashMap<Symbol, InstrumentSpec>,
    by_token: HashMap<InstrumentToken, Symbol>,
}

impl InstrumentManifest {
    pub fn build(specs: impl IntoIterator<Item = InstrumentSpec>) -> Result<Self, ManifestError> {
        let mut by_symbol = HashMap::new();
        let mut by_token = HashMap::new();
        for spec in specs {
            if by_symbol.contains_key(&spec.symbol) {
                return Err(ManifestError::DuplicateSymbol(spec.symbol));
            }
            if by_token.contains_key(&spec.token) {
                return Err(ManifestError::DuplicateToken(spec.token));
            }
            by_token.insert(spec.token, spec.symbol.clone());
            by_symbol.insert(spec.symbol.clone(), spec);
        }
        Ok(Self { by_symbol, by_token })
    }

    pub fn symbol_for_token(&self, token: InstrumentToken) -> Result<&Symbol, ManifestError> {
        self.by_token
            .get(&token)
            .ok_or(ManifestError::UnknownToken(token))
    }

    pub fn spec(&self, symbol: &Symbol) -> Result<&InstrumentSpec, ManifestError> {
        self.by_symbol
            .get(symbol)
            .ok_or_else(|| ManifestError::UnknownSymbol(symbol.clone()))
    }

    pub fn token_for_symbol(&self, symbol: &Symbol) -> Result<InstrumentToken, ManifestError> {
        self.spec(symbol).map(|spec| spec.token)
    }

    pub fn universe(&self) -> impl Iterator<Item = &Symbol> {
        self.by_symbol.keys()
    }

    pub fn tokens(&self) -> impl Iterator<Item = InstrumentToken> + '_ {
        self.by_token.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.by_symbol.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn spec(symbol: &str, token: i64) -> InstrumentSpec {
        InstrumentSpec {
            symbol: Symbol::new(symbol),
            token: InstrumentToken(token),
            tick_size: dec!(0.05),
            lot_size: 1,
        }
    }

    #[test]
    fn resolves_both_directions() {
        let manifest = InstrumentManifest::build([spec("X", 1), spec("Y", 2)]).unwrap();
        assert_eq!(
            manifest.symbol_for_token(InstrumentToken(1)).unwrap(),
            &Symbol::new("X")
        );
        assert_eq!(
            manifest.token_for_symbol(&Symbol::new("Y")).unwrap(),
            InstrumentToken(2)
        );
    }

    #[test]
    fn rejects_duplicate_symbol() {
        let err = InstrumentManifest::build([spec("X", 1), spec("X", 2)]).unwrap_err();
        assert_eq!(err, ManifestError::DuplicateSymbol(Symbol::new("X")));
    }

    #[test]
    fn rejects_duplicate_token() {
        let err = InstrumentManifest::build([spec("X", 1), spec("Y", 1)]).unwrap_err();
        assert_eq!(err, ManifestError::DuplicateToken(InstrumentToken(1)));
    }
}
