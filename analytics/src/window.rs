//! Fixed-capacity rolling windows backing the SMA/EMA/RSI calculators.

use rust_decimal::Decimal;
use std::collections::VecDeque;

/// A rolling window of the last `capacity` closes for one `(symbol, timeframe)`.
#[derive(Debug, Clone, Default)]
pub struct RollingWindow {
    capacity: usize,
    values: VecDeque<Decimal>,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            values: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, value: Decimal) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Simple moving average over everything currently in the window.
    /// `None` until the window has at least one value.
    pub fn sma(&self) -> Option<Decimal> {
        if self.values.is_empty() {
            return None;
        }
        let sum: Decimal = self.values.iter().copied().sum();
        Some(sum / Decimal::from(self.values.len() as u64))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Decimal> {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn evicts_oldest_once_full() {
        let mut w = RollingWindow::new(3);
        w.push(dec!(1));
        w.push(dec!(2));
        w.push(dec!(3));
        assert_eq!(w.sma(), Some(dec!(2)));
        w.push(dec!(7));
        // oldest (1) evicted: (2+3+7)/3
        assert_eq!(w.sma(), Some(dec!(4)));
    }
}
