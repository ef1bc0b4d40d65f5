use crate::Indicator;
use rust_decimal::Decimal;
use std::collections::VecDeque;

/// Simple moving average over a fixed window.
///
/// Keeps a circular buffer and a running sum so each update is O(1).
#[derive(Debug, Clone)]
pub struct SimpleMovingAverage {
    period: usize,
    values: VecDeque<Decimal>,
    sum: Decimal,
}

impl SimpleMovingAverage {
    /// Create a new SMA with the given period.
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            values: VecDeque::with_capacity(period),
            sum: Decimal::ZERO,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Current average, once the window is full.
    pub fn value(&self) -> Option<Decimal> {
        self.is_ready()
            .then(|| self.sum / Decimal::from(self.period as u64))
    }
}

impl Indicator for SimpleMovingAverage {
    type Input = Decimal;
    type Output = Decimal;

    fn name(&self) -> &'static str {
        "sma"
    }

    fn is_ready(&self) -> bool {
        self.values.len() == self.period
    }

    fn update(&mut self, value: Decimal) -> Option<Decimal> {
        self.values.push_back(value);
        self.sum += value;
        if self.values.len() > self.period {
            if let Some(oldest) = self.values.pop_front() {
                self.sum -= oldest;
            }
        }
        self.value()
    }

    fn reset(&mut self) {
        self.values.clear();
        self.sum = Decimal::ZERO;
    }
}
