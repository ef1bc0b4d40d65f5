use crate::Indicator;
use rust_decimal::Decimal;

/// Exponential moving average, seeded with an SMA over the first `period`
/// samples, then `ema <- (x - ema) * alpha + ema` with `alpha = 2/(period+1)`.
#[derive(Debug, Clone)]
pub struct ExponentialMovingAverage {
    period: usize,
    alpha: Decimal,
    seed_sum: Decimal,
    seed_count: usize,
    value: Option<Decimal>,
}

impl ExponentialMovingAverage {
    /// Create a new EMA with the given period.
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            alpha: Decimal::TWO / Decimal::from(period as u64 + 1),
            seed_sum: Decimal::ZERO,
            seed_count: 0,
            value: None,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn value(&self) -> Option<Decimal> {
        self.value
    }
}

impl Indicator for ExponentialMovingAverage {
    type Input = Decimal;
    type Output = Decimal;

    fn name(&self) -> &'static str {
        "ema"
    }

    fn is_ready(&self) -> bool {
        self.value.is_some()
    }

    fn update(&mut self, sample: Decimal) -> Option<Decimal> {
        match self.value {
            Some(previous) => {
                let next = (sample - previous) * self.alpha + previous;
                self.value = Some(next);
            }
            None => {
                self.seed_sum += sample;
                self.seed_count += 1;
                if self.seed_count == self.period {
                    self.value = Some(self.seed_sum / Decimal::from(self.period as u64));
                }
            }
        }
        self.value
    }

    fn reset(&mut self) {
        self.seed_sum = Decimal::ZERO;
        self.seed_count = 0;
        self.value = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sma_seed_over_first_period() {
        let mut ema = ExponentialMovingAverage::new(3);
        assert_eq!(ema.update(dec!(1)), None);
        assert_eq!(ema.update(dec!(2)), None);
        // Seed is the plain average of the first three samples.
        assert_eq!(ema.update(dec!(3)), Some(dec!(2)));
    }

    #[test]
    fn test_smoothing_after_seed() {
        let mut ema = ExponentialMovingAverage::new(3);
        for value in [1, 2, 3] {
            ema.update(Decimal::from(value));
        }
        // alpha = 2/4 = 0.5; ema = (6 - 2) * 0.5 + 2 = 4.
        assert_eq!(ema.update(dec!(6)), Some(dec!(4)));
    }

    #[test]
    fn test_reset() {
        let mut ema = ExponentialMovingAverage::new(2);
        ema.update(dec!(1));
        ema.update(dec!(2));
        assert!(ema.is_ready());
        ema.reset();
        assert!(!ema.is_ready());
        assert_eq!(ema.value(), None);
    }
}
