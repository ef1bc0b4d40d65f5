use crate::Indicator;
use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Output bands of the Bollinger indicator.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct BollingerOutput {
    pub upper: Decimal,
    pub middle: Decimal,
    pub lower: Decimal,
}

/// Bollinger bands: `SMA(period) +/- k * sigma`, with sigma the population
/// standard deviation across the last `period` samples.
///
/// Running sums of values and squares keep each update O(1).
#[derive(Debug, Clone)]
pub struct BollingerBands {
    period: usize,
    width: Decimal,
    values: VecDeque<Decimal>,
    sum: Decimal,
    sum_squares: Decimal,
}

impl BollingerBands {
    /// Create bands over `period` samples at `width` standard deviations.
    pub fn new(period: usize, width: Decimal) -> Self {
        let period = period.max(1);
        Self {
            period,
            width,
            values: VecDeque::with_capacity(period),
            sum: Decimal::ZERO,
            sum_squares: Decimal::ZERO,
        }
    }

    pub fn value(&self) -> Option<BollingerOutput> {
        if !self.is_ready() {
            return None;
        }

        let period = Decimal::from(self.period as u64);
        let mean = self.sum / period;
        let variance = (self.sum_squares / period - mean * mean).max(Decimal::ZERO);
        let sigma = variance.sqrt().unwrap_or(Decimal::ZERO);
        let spread = self.width * sigma;

        Some(BollingerOutput {
            upper: mean + spread,
            middle: mean,
            lower: mean - spread,
        })
    }
}

impl Indicator for BollingerBands {
    type Input = Decimal;
    type Output = BollingerOutput;

    fn name(&self) -> &'static str {
        "bollinger"
    }

    fn is_ready(&self) -> bool {
        self.values.len() == self.period
    }

    fn update(&mut self, sample: Decimal) -> Option<BollingerOutput> {
        self.values.push_back(sample);
        self.sum += sample;
        self.sum_squares += sample * sample;

        if self.values.len() > self.period {
            if let Some(oldest) = self.values.pop_front() {
                self.sum -= oldest;
                self.sum_squares -= oldest * oldest;
            }
        }

        self.value()
    }

    fn reset(&mut self) {
        self.values.clear();
        self.sum = Decimal::ZERO;
        self.sum_squares = Decimal::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_band_ordering_holds() {
        let mut bands = BollingerBands::new(4, dec!(2));
        let mut last = None;
        for sample in [100, 101, 99, 102, 98, 103, 100] {
            last = bands.update(Decimal::from(sample));
        }
        let output = last.unwrap();
        assert!(output.upper >= output.middle);
        assert!(output.middle >= output.lower);
    }

    #[test]
    fn test_flat_series_collapses_bands() {
        let mut bands = BollingerBands::new(3, dec!(2));
        bands.update(dec!(50));
        bands.update(dec!(50));
        let output = bands.update(dec!(50)).unwrap();
        assert_eq!(output.upper, dec!(50));
        assert_eq!(output.middle, dec!(50));
        assert_eq!(output.lower, dec!(50));
    }

    #[test]
    fn test_not_ready_before_window_fills() {
        let mut bands = BollingerBands::new(3, dec!(2));
        assert_eq!(bands.update(dec!(1)), None);
        assert_eq!(bands.update(dec!(2)), None);
        assert!(bands.update(dec!(3)).is_some());
    }
}
