use crate::{CoreError, Symbol};
use chrono::{DateTime, Duration as ChronoDuration, DurationRound, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, time::Duration};

/// Fixed aggregation window for OHLCV candles, eg/ "1m", "15m", "1h", "4h", "1d".
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct CandleInterval {
    secs: u64,
}

impl CandleInterval {
    pub const fn from_secs(secs: u64) -> Self {
        Self { secs }
    }

    pub const fn minutes(minutes: u64) -> Self {
        Self::from_secs(minutes * 60)
    }

    pub const fn hours(hours: u64) -> Self {
        Self::from_secs(hours * 3600)
    }

    pub const fn as_secs(&self) -> u64 {
        self.secs
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.secs)
    }

    /// Align the provided instant down to the window containing it. Windows
    /// are integer multiples of the interval from the Unix epoch.
    pub fn align(&self, time: DateTime<Utc>) -> DateTime<Utc> {
        time.duration_trunc(ChronoDuration::seconds(self.secs as i64))
            .unwrap_or(time)
    }
}

impl fmt::Display for CandleInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.secs % 86_400 == 0 {
            write!(f, "{}d", self.secs / 86_400)
        } else if self.secs % 3600 == 0 {
            write!(f, "{}h", self.secs / 3600)
        } else if self.secs % 60 == 0 {
            write!(f, "{}m", self.secs / 60)
        } else {
            write!(f, "{}s", self.secs)
        }
    }
}

impl FromStr for CandleInterval {
    type Err = CoreError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        let (value, unit) = label.split_at(label.len().saturating_sub(1));
        let value = value
            .parse::<u64>()
            .map_err(|_| CoreError::InvalidInterval(label.to_string()))?;

        let secs = match unit {
            "s" => value,
            "m" => value * 60,
            "h" => value * 3600,
            "d" => value * 86_400,
            _ => return Err(CoreError::InvalidInterval(label.to_string())),
        };

        if secs == 0 {
            return Err(CoreError::InvalidInterval(label.to_string()));
        }

        Ok(Self { secs })
    }
}

impl Serialize for CandleInterval {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CandleInterval {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}

/// Immutable OHLCV bar aggregated over one [`CandleInterval`] window.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candle {
    pub symbol: Symbol,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub open_time: DateTime<Utc>,
    pub close_time: DateTime<Utc>,
    pub interval: CandleInterval,
}

impl Candle {
    /// True if the OHLC ordering and window alignment invariants hold.
    pub fn is_well_formed(&self) -> bool {
        let body_low = self.open.min(self.close);
        let body_high = self.open.max(self.close);

        self.low <= body_low
            && body_high <= self.high
            && self.interval.align(self.open_time) == self.open_time
            && (self.close_time - self.open_time).num_seconds() as u64 == self.interval.as_secs()
    }
}
