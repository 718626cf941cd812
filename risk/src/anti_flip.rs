//! Anti-flip re-entry guard (§4.5/§8): once a symbol has an exit on record,
//! price must recover past the exit price by the configured `antiFlipPct`
//! before a fresh entry is allowed. A symbol with no recorded exit has
//! nothing to guard against and always passes.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Default `antiFlipPct` (§6) expressed as a multiplier, used where the
/// caller has no `EngineConfig` to draw from (tests, `demos/`).
pub const ANTI_FLIP_MULTIPLIER: Decimal = dec!(1.0025);

/// `anti_flip_pct` is the configured fraction (e.g. `0.0025` for the
/// default above); the reentry threshold is `exit_price * (1 + anti_flip_pct)`.
pub fn passes_anti_flip(
    last_price: Decimal,
    last_exit_price: Option<Decimal>,
    anti_flip_pct: Decimal,
) -> bool {
    match last_exit_price {
        None => true,
        Some(exit_price) => last_price >= exit_price * (Decimal::ONE + anti_flip_pct),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PCT: Decimal = dec!(0.0025);

    #[test]
    fn no_prior_exit_always_passes() {
        assert!(passes_anti_flip(dec!(48.80), None, PCT));
    }

    #[test]
    fn below_reentry_threshold_fails() {
        assert!(!passes_anti_flip(dec!(48.80), Some(dec!(48.75)), PCT));
    }

    #[test]
    fn at_or_above_reentry_threshold_passes() {
        assert!(passes_anti_flip(dec!(49.00), Some(dec!(48.75)), PCT));
    }
}
