//! SMA, EMA, and Wilder's RSI over rolling windows of closes (§4.3).

use crate::window::RollingWindow;
use rust_decimal::Decimal;

/// Wilder-smoothed 14-period RSI, fed one close at a time.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    prev_close: Option<Decimal>,
    avg_gain: Option<Decimal>,
    avg_loss: Option<Decimal>,
    seed_gains: Vec<Decimal>,
    seed_losses: Vec<Decimal>,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            prev_close: None,
            avg_gain: None,
            avg_loss: None,
            seed_gains: Vec::with_capacity(period),
            seed_losses: Vec::with_capacity(period),
        }
    }

    pub fn push(&mut self, close: Decimal) -> Option<Decimal> {
        let Some(prev) = self.prev_close.replace(close) else {
            return None;
        };
        let change = close - prev;
        let gain = change.max(Decimal::ZERO);
        let loss = (-change).max(Decimal::ZERO);

        match (self.avg_gain, self.avg_loss) {
            (Some(avg_gain), Some(avg_loss)) => {
                let period = Decimal::from(self.period as u64);
                let new_gain = (avg_gain * (period - Decimal::ONE) + gain) / period;
                let new_loss = (avg_loss * (period - Decimal::ONE) + loss) / period;
                self.avg_gain = Some(new_gain);
                self.avg_loss = Some(new_loss);
            }
            _ => {
                self.seed_gains.push(gain);
                self.seed_losses.push(loss);
                if self.seed_gains.len() == self.period {
                    let period = Decimal::from(self.period as u64);
                    let avg_gain: Decimal = self.seed_gains.iter().copied().sum::<Decimal>() / period;
                    let avg_loss: Decimal = self.seed_losses.iter().copied().sum::<Decimal>() / period;
                    self.avg_gain = Some(avg_gain);
                    self.avg_loss = Some(avg_loss);
                }
            }
        }

        self.value()
    }

    pub fn value(&self) -> Option<Decimal> {
        let (avg_gain, avg_loss) = (self.avg_gain?, self.avg_loss?);
        if avg_loss == Decimal::ZERO {
            return Some(Decimal::from(100u8));
        }
        let rs = avg_gain / avg_loss;
        Some(Decimal::from(100u8) - Decimal::from(100u8) / (Decimal::ONE + rs))
    }
}

/// Exponential moving average, seeded by the first value pushed.
#[derive(Debug, Clone)]
pub struct Ema {
    alpha: Decimal,
    value: Option<Decimal>,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        let period = Decimal::from(period as u64);
        let alpha = Decimal::from(2u8) / (period + Decimal::ONE);
        Self { alpha, value: None }
    }

    pub fn push(&mut self, close: Decimal) -> Decimal {
        let next = match self.value {
            None => close,
            Some(prev) => self.alpha * close + (Decimal::ONE - self.alpha) * prev,
        };
        self.value = Some(next);
        next
    }

    pub fn value(&self) -> Option<Decimal> {
        self.value
    }
}

/// Percentage deviation of `price` above (positive) or below (negative) `baseline`.
pub fn pct_deviation(price: Decimal, baseline: Decimal) -> Option<Decimal> {
    if baseline == Decimal::ZERO {
        return None;
    }
    Some((price - baseline) / baseline * Decimal::from(100u8))
}

/// Convenience: SMA of a rolling window, delegating to [`RollingWindow::sma`].
pub fn sma(window: &RollingWindow) -> Option<Decimal> {
    window.sma()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rsi_is_100_with_no_losses() {
        let mut rsi = Rsi::new(3);
        for close in [dec!(10), dec!(11), dec!(12), dec!(13)] {
            rsi.push(close);
        }
        assert_eq!(rsi.value(), Some(dec!(100)));
    }

    #[test]
    fn rsi_is_none_before_seeded() {
        let mut rsi = Rsi::new(14);
        assert_eq!(rsi.push(dec!(10)), None);
    }

    #[test]
    fn pct_deviation_sign_follows_direction() {
        assert_eq!(pct_deviation(dec!(103), dec!(100)), Some(dec!(3)));
        assert_eq!(pct_deviation(dec!(97), dec!(100)), Some(dec!(-3)));
    }
}
