use crate::{CandleSample, Indicator};
use rust_decimal::Decimal;

/// Average true range with Wilder smoothing.
///
/// True range is `max(high - low, |high - prevClose|, |low - prevClose|)`;
/// the first `period` ranges seed the average, after which
/// `atr <- (atr * (period - 1) + tr) / period`.
#[derive(Debug, Clone)]
pub struct AverageTrueRange {
    period: usize,
    previous_close: Option<Decimal>,
    seed_sum: Decimal,
    seed_count: usize,
    value: Option<Decimal>,
}

impl AverageTrueRange {
    /// Create a new ATR with the given period.
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            previous_close: None,
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

    fn true_range(&self, sample: &CandleSample) -> Decimal {
        let range = sample.high - sample.low;
        match self.previous_close {
            Some(previous_close) => range
                .max((sample.high - previous_close).abs())
                .max((sample.low - previous_close).abs()),
            None => range,
        }
    }
}

impl Indicator for AverageTrueRange {
    type Input = CandleSample;
    type Output = Decimal;

    fn name(&self) -> &'static str {
        "atr"
    }

    fn is_ready(&self) -> bool {
        self.value.is_some()
    }

    fn update(&mut self, sample: CandleSample) -> Option<Decimal> {
        let true_range = self.true_range(&sample);
        self.previous_close = Some(sample.close);
        let period = Decimal::from(self.period as u64);

        match self.value {
            Some(average) => {
                self.value = Some((average * (period - Decimal::ONE) + true_range) / period);
            }
            None => {
                self.seed_sum += true_range;
                self.seed_count += 1;
                if self.seed_count == self.period {
                    self.value = Some(self.seed_sum / period);
                }
            }
        }

        self.value
    }

    fn reset(&mut self) {
        self.previous_close = None;
        self.seed_sum = Decimal::ZERO;
        self.seed_count = 0;
        self.value = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample(high: Decimal, low: Decimal, close: Decimal) -> CandleSample {
        CandleSample { high, low, close }
    }

    #[test]
    fn test_first_range_ignores_previous_close() {
        let mut atr = AverageTrueRange::new(1);
        assert_eq!(atr.update(sample(dec!(105), dec!(95), dec!(100))), Some(dec!(10)));
    }

    #[test]
    fn test_gap_extends_true_range() {
        let mut atr = AverageTrueRange::new(1);
        atr.update(sample(dec!(105), dec!(95), dec!(100)));
        // Gap up: high - prevClose dominates the bar's own range.
        assert_eq!(atr.update(sample(dec!(120), dec!(115), dec!(118))), Some(dec!(20)));
    }

    #[test]
    fn test_wilder_smoothing() {
        let mut atr = AverageTrueRange::new(2);
        atr.update(sample(dec!(12), dec!(8), dec!(10)));
        // Second bar: tr = max(4, |12-10|, |8-10|) = 4; seed avg = 4.
        atr.update(sample(dec!(12), dec!(8), dec!(10)));
        assert_eq!(atr.value(), Some(dec!(4)));
        // tr = max(2, 3, 1) = 3; atr = (4 * 1 + 3) / 2 = 3.5.
        assert_eq!(atr.update(sample(dec!(13), dec!(11), dec!(12))), Some(dec!(3.5)));
    }
}
