//! `Rank_GM` momentum score (§4.3, GLOSSARY).
//!
//! ```text
//! g1        = 1 + pctVsSma15m / 100
//! g2        = 1 + pctVsSmaDaily / 100
//! rankGm    = (sqrt(g1 * g2) - 1) * 100
//! accel     = rankGm - rankGmPrev
//! rankFinal = rankGm + accelWeight * accel
//! ```
//!
//! Both inputs are percentage deviations of price from a moving average;
//! negative deviations flow naturally into a negative `rankGm` — there is no
//! special-casing for a symbol trading below its averages.

use rust_decimal::{Decimal, MathematicalOps};

/// Computes `rankGm` from the two percentage deviations.
pub fn rank_gm(pct_vs_sma_15m: Decimal, pct_vs_sma_daily: Decimal) -> Decimal {
    let hundred = Decimal::from(100u8);
    let g1 = Decimal::ONE + pct_vs_sma_15m / hundred;
    let g2 = Decimal::ONE + pct_vs_sma_daily / hundred;
    let product = g1 * g2;
    // A product at or below zero has no real geometric mean; treat the
    // score as maximally negative rather than panicking on sqrt of a
    // negative number.
    if product <= Decimal::ZERO {
        return -hundred;
    }
    (product.sqrt().unwrap_or(Decimal::ZERO) - Decimal::ONE) * hundred
}

/// `rankFinal = rankGm + accelWeight * accel`.
pub fn rank_final(rank_gm: Decimal, accel: Decimal, accel_weight: Decimal) -> Decimal {
    rank_gm + accel_weight * accel
}

/// Strict `>` entry filter per §4.3 and the boundary test in §8 (exactly at
/// threshold does not pass).
pub fn passes_entry_filter(rank_final: Decimal, threshold: Decimal) -> bool {
    rank_final > threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn scenario_one_below_threshold_then_above() {
        // sma15m=99, smaDaily=98, price=100 -> pctVsSma15m ~1.0101, pctVsSmaDaily ~2.0408
        let pct_15m = crate::indicators::pct_deviation(dec!(100), dec!(99)).unwrap();
        let pct_daily = crate::indicators::pct_deviation(dec!(100), dec!(98)).unwrap();
        let rank = rank_gm(pct_15m, pct_daily);
        let accel = rank - Decimal::ZERO; // rankGmPrev = 0
        let final_rank = rank_final(rank, accel, dec!(0.3));
        assert!(final_rank < dec!(2.5));

        let pct_15m = crate::indicators::pct_deviation(dec!(103), dec!(99)).unwrap();
        let pct_daily = crate::indicators::pct_deviation(dec!(103), dec!(98)).unwrap();
        let rank2 = rank_gm(pct_15m, pct_daily);
        let accel2 = rank2 - rank;
        let final_rank2 = rank_final(rank2, accel2, dec!(0.3));
        assert!(final_rank2 > dec!(2.5));
    }

    #[test]
    fn exact_threshold_does_not_pass() {
        assert!(!passes_entry_filter(dec!(2.5), dec!(2.5)));
        assert!(passes_entry_filter(dec!(2.500001), dec!(2.5)));
    }

    #[test]
    fn negative_deviation_yields_negative_rank() {
        let pct_15m = dec!(-2);
        let pct_daily = dec!(-3);
        assert!(rank_gm(pct_15m, pct_daily) < Decimal::ZERO);
    }
}
