use crate::{
    Indicator, IndicatorError,
    indicators::ema::ExponentialMovingAverage,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Output triple of the MACD indicator.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct MacdOutput {
    pub macd: Decimal,
    pub signal: Decimal,
    pub histogram: Decimal,
}

/// Moving average convergence/divergence: `EMA(fast) - EMA(slow)` with a
/// signal line that is an EMA of that difference.
#[derive(Debug, Clone)]
pub struct Macd {
    fast: ExponentialMovingAverage,
    slow: ExponentialMovingAverage,
    signal: ExponentialMovingAverage,
    latest: Option<MacdOutput>,
}

impl Macd {
    /// Construct a MACD. The fast period must be strictly shorter than the
    /// slow period and no period may be zero.
    pub fn new(fast: usize, slow: usize, signal: usize) -> Result<Self, IndicatorError> {
        if fast == 0 || slow == 0 || signal == 0 {
            return Err(IndicatorError::ZeroPeriod);
        }
        if fast >= slow {
            return Err(IndicatorError::FastNotBelowSlow { fast, slow });
        }

        Ok(Self {
            fast: ExponentialMovingAverage::new(fast),
            slow: ExponentialMovingAverage::new(slow),
            signal: ExponentialMovingAverage::new(signal),
            latest: None,
        })
    }

    pub fn value(&self) -> Option<MacdOutput> {
        self.latest
    }
}

impl Indicator for Macd {
    type Input = Decimal;
    type Output = MacdOutput;

    fn name(&self) -> &'static str {
        "macd"
    }

    fn is_ready(&self) -> bool {
        self.latest.is_some()
    }

    fn update(&mut self, sample: Decimal) -> Option<MacdOutput> {
        let fast = self.fast.update(sample);
        let slow = self.slow.update(sample);

        let (Some(fast), Some(slow)) = (fast, slow) else {
            return None;
        };

        let macd = fast - slow;
        let signal = self.signal.update(macd)?;

        let output = MacdOutput {
            macd,
            signal,
            histogram: macd - signal,
        };
        self.latest = Some(output);
        Some(output)
    }

    fn reset(&mut self) {
        self.fast.reset();
        self.slow.reset();
        self.signal.reset();
        self.latest = None;
    }
}
