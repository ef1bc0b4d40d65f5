use crate::Symbol;
use chrono::{DateTime, Utc};
use derive_more::Constructor;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Immutable snapshot of one trade update received from the exchange.
///
/// Timestamps carry millisecond precision, UTC.
#[derive(Clone, PartialEq, Eq, Debug, Constructor, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketTick {
    pub symbol: Symbol,
    pub price: Decimal,
    pub volume: Decimal,
    pub bid: Decimal,
    pub ask: Decimal,
    pub time: DateTime<Utc>,
}

impl MarketTick {
    /// Mid-point between the best bid and ask.
    pub fn mid(&self) -> Decimal {
        (self.bid + self.ask) / Decimal::TWO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_mid_price() {
        let tick = MarketTick::new(
            Symbol::new("BTCUSDT"),
            dec!(100),
            dec!(1),
            dec!(99),
            dec!(101),
            Utc::now(),
        );
        assert_eq!(tick.mid(), dec!(100));
    }

    #[test]
    fn test_camel_case_wire_format() {
        let tick = MarketTick::new(
            Symbol::new("ETHUSDT"),
            dec!(2000.5),
            dec!(0.25),
            dec!(2000),
            dec!(2001),
            DateTime::from_timestamp_millis(1_717_000_000_000).unwrap(),
        );
        let json = serde_json::to_string(&tick).unwrap();
        assert!(json.contains("\"symbol\":\"ETHUSDT\""));
        assert!(json.contains("\"price\":\"2000.5\""));
        let roundtrip: MarketTick = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip, tick);
    }
}
