//! Per-position policy table (§4.5): stop/target/trail percentages and the
//! ladder progression preconditions, indexed by [`PositionIndex`].

use engine_trader::PositionIndex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Entry threshold gating P2/P3 progression, evaluated against the PnL% of
/// the rung(s) already open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LadderGate {
    /// P1's own PnL% must meet the threshold.
    P1PnlAtLeast(Decimal),
    /// The mean of P1 and P2's PnL% must meet the threshold.
    MeanP1P2AtLeast(Decimal),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionPolicy {
    pub stop_pct: Decimal,
    pub target_pct: Option<Decimal>,
    /// Trailing distance behind the high-water mark, as a positive fraction.
    pub trail_pct: Decimal,
    pub gate: Option<LadderGate>,
}

impl PositionPolicy {
    pub fn for_index(index: PositionIndex) -> Self {
        match index {
            PositionIndex::P1 => Self {
                stop_pct: dec!(-0.025),
                target_pct: Some(dec!(0.05)),
                trail_pct: dec!(0.025),
                gate: None,
            },
            PositionIndex::P2 => Self {
                stop_pct: dec!(-0.025),
                target_pct: None,
                trail_pct: dec!(0.001),
                gate: Some(LadderGate::P1PnlAtLeast(dec!(0.25))),
            },
            PositionIndex::P3 => Self {
                stop_pct: dec!(-0.05),
                target_pct: None,
                trail_pct: dec!(0.001),
                gate: Some(LadderGate::MeanP1P2AtLeast(dec!(1.0))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn p1_has_a_target_and_no_gate() {
        let policy = PositionPolicy::for_index(PositionIndex::P1);
        assert_eq!(policy.target_pct, Some(dec!(0.05)));
        assert!(policy.gate.is_none());
    }

    #[test]
    fn p2_and_p3_are_runners_gated_on_pnl() {
        assert_eq!(
            PositionPolicy::for_index(PositionIndex::P2).gate,
            Some(LadderGate::P1PnlAtLeast(dec!(0.25)))
        );
        assert_eq!(
            PositionPolicy::for_index(PositionIndex::P3).gate,
            Some(LadderGate::MeanP1P2AtLeast(dec!(1.0)))
        );
    }
}
