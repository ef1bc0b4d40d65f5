use crate::Indicator;
use rust_decimal::Decimal;

/// Relative strength index with Wilder's smoothing.
///
/// The first `period` price deltas seed the average gain/loss; afterwards
/// `avg <- (avg * (period - 1) + new) / period`. Output is
/// `100 * avgGain / (avgGain + avgLoss)`, pinned to 100 when the average
/// loss is zero.
#[derive(Debug, Clone)]
pub struct RelativeStrengthIndex {
    period: usize,
    previous: Option<Decimal>,
    seed_gain: Decimal,
    seed_loss: Decimal,
    seed_count: usize,
    averages: Option<(Decimal, Decimal)>,
}

impl RelativeStrengthIndex {
    /// Create a new RSI with the given period.
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            previous: None,
            seed_gain: Decimal::ZERO,
            seed_loss: Decimal::ZERO,
            seed_count: 0,
            averages: None,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn value(&self) -> Option<Decimal> {
        self.averages.map(|(gain, loss)| Self::index(gain, loss))
    }

    fn index(avg_gain: Decimal, avg_loss: Decimal) -> Decimal {
        if avg_loss.is_zero() {
            Decimal::ONE_HUNDRED
        } else {
            Decimal::ONE_HUNDRED * avg_gain / (avg_gain + avg_loss)
        }
    }
}

impl Indicator for RelativeStrengthIndex {
    type Input = Decimal;
    type Output = Decimal;

    fn name(&self) -> &'static str {
        "rsi"
    }

    fn is_ready(&self) -> bool {
        self.averages.is_some()
    }

    fn update(&mut self, sample: Decimal) -> Option<Decimal> {
        let Some(previous) = self.previous.replace(sample) else {
            return None;
        };

        let delta = sample - previous;
        let gain = delta.max(Decimal::ZERO);
        let loss = (-delta).max(Decimal::ZERO);
        let period = Decimal::from(self.period as u64);

        match self.averages {
            Some((avg_gain, avg_loss)) => {
                let smoothing = period - Decimal::ONE;
                self.averages = Some((
                    (avg_gain * smoothing + gain) / period,
                    (avg_loss * smoothing + loss) / period,
                ));
            }
            None => {
                self.seed_gain += gain;
                self.seed_loss += loss;
                self.seed_count += 1;
                if self.seed_count == self.period {
                    self.averages = Some((self.seed_gain / period, self.seed_loss / period));
                }
            }
        }

        self.value()
    }

    fn reset(&mut self) {
        self.previous = None;
        self.seed_gain = Decimal::ZERO;
        self.seed_loss = Decimal::ZERO;
        self.seed_count = 0;
        self.averages = None;
    }
}
