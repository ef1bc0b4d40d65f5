use crate::{
    CandleSample, Indicator,
    indicators::atr::AverageTrueRange,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction the SuperTrend stop is trailing.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum Trend {
    Up,
    Down,
}

/// Active band value and trend direction.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct SuperTrendOutput {
    /// The trailing stop: lower band in an up-trend, upper band in a down-trend.
    pub value: Decimal,
    pub trend: Trend,
}

/// ATR-based trailing stop.
///
/// Basic bands sit at `mid +/- multiplier * ATR` around the bar midpoint.
/// Band hysteresis: a band only ratchets in the trend's favour unless the
/// prior close already broke through it. The trend flips when the close
/// crosses the prior final band.
#[derive(Debug, Clone)]
pub struct SuperTrend {
    multiplier: Decimal,
    atr: AverageTrueRange,
    previous_close: Option<Decimal>,
    final_upper: Option<Decimal>,
    final_lower: Option<Decimal>,
    trend: Trend,
    latest: Option<SuperTrendOutput>,
}

impl SuperTrend {
    /// Create a SuperTrend over an ATR of `period` at the given band multiplier.
    pub fn new(period: usize, multiplier: Decimal) -> Self {
        Self {
            multiplier,
            atr: AverageTrueRange::new(period),
            previous_close: None,
            final_upper: None,
            final_lower: None,
            trend: Trend::Down,
            latest: None,
        }
    }

    pub fn value(&self) -> Option<SuperTrendOutput> {
        self.latest
    }
}

impl Indicator for SuperTrend {
    type Input = CandleSample;
    type Output = SuperTrendOutput;

    fn name(&self) -> &'static str {
        "supertrend"
    }

    fn is_ready(&self) -> bool {
        self.latest.is_some()
    }

    fn update(&mut self, sample: CandleSample) -> Option<SuperTrendOutput> {
        let close = sample.close;
        let Some(atr) = self.atr.update(sample) else {
            self.previous_close = Some(close);
            return None;
        };

        let mid = (sample.high + sample.low) / Decimal::TWO;
        let basic_upper = mid + self.multiplier * atr;
        let basic_lower = mid - self.multiplier * atr;

        // Hysteresis: only tighten a band unless the prior close broke it.
        let final_upper = match (self.final_upper, self.previous_close) {
            (Some(previous_band), Some(previous_close))
                if basic_upper >= previous_band && previous_close <= previous_band =>
            {
                previous_band
            }
            _ => basic_upper,
        };
        let final_lower = match (self.final_lower, self.previous_close) {
            (Some(previous_band), Some(previous_close))
                if basic_lower <= previous_band && previous_close >= previous_band =>
            {
                previous_band
            }
            _ => basic_lower,
        };

        // Flip when the close crosses the prior final band.
        self.trend = match (self.trend, self.final_upper, self.final_lower) {
            (Trend::Down, Some(previous_upper), _) if close > previous_upper => Trend::Up,
            (Trend::Up, _, Some(previous_lower)) if close < previous_lower => Trend::Down,
            (current, _, _) => current,
        };

        let output = SuperTrendOutput {
            value: match self.trend {
                Trend::Up => final_lower,
                Trend::Down => final_upper,
            },
            trend: self.trend,
        };

        self.final_upper = Some(final_upper);
        self.final_lower = Some(final_lower);
        self.previous_close = Some(close);
        self.latest = Some(output);

        Some(output)
    }

    fn reset(&mut self) {
        self.atr.reset();
        self.previous_close = None;
        self.final_upper = None;
        self.final_lower = None;
        self.trend = Trend::Down;
        self.latest = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bar(high: Decimal, low: Decimal, close: Decimal) -> CandleSample {
        CandleSample { high, low, close }
    }

    #[test]
    fn test_warmup_matches_atr_period() {
        let mut supertrend = SuperTrend::new(2, dec!(3));
        assert_eq!(supertrend.update(bar(dec!(12), dec!(8), dec!(10))), None);
        assert!(supertrend.update(bar(dec!(12), dec!(8), dec!(10))).is_some());
    }

    #[test]
    fn test_rally_flips_trend_up() {
        let mut supertrend = SuperTrend::new(2, dec!(1));
        supertrend.update(bar(dec!(11), dec!(9), dec!(10)));
        supertrend.update(bar(dec!(11), dec!(9), dec!(10)));
        // ATR = 2; bands at 10 +/- 2. A close through the prior upper band
        // flips the trend and swings the stop to the lower band.
        let output = supertrend.update(bar(dec!(16), dec!(12), dec!(15))).unwrap();
        assert_eq!(output.trend, Trend::Up);
        assert!(output.value < dec!(15));
    }

    #[test]
    fn test_collapse_flips_trend_back_down() {
        let mut supertrend = SuperTrend::new(2, dec!(1));
        supertrend.update(bar(dec!(11), dec!(9), dec!(10)));
        supertrend.update(bar(dec!(11), dec!(9), dec!(10)));
        supertrend.update(bar(dec!(16), dec!(12), dec!(15)));
        assert_eq!(supertrend.value().unwrap().trend, Trend::Up);

        let output = supertrend.update(bar(dec!(9), dec!(5), dec!(6))).unwrap();
        assert_eq!(output.trend, Trend::Down);
    }
}
