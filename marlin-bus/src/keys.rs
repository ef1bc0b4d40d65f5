//! Well-known cache keys and channels.

use std::time::Duration;

/// Latest price per symbol, stored as an 8 decimal place string.
pub fn price_latest(symbol: &str) -> String {
    format!("price:latest:{symbol}")
}

/// Latest serialised tick per symbol.
pub fn tick_latest(symbol: &str) -> String {
    format!("tick:latest:{symbol}")
}

/// Serialised portfolio snapshot maintained by the risk service.
pub const PORTFOLIO_SNAPSHOT: &str = "portfolio:snapshot";

/// Out-of-band channel carrying the JSON tick for gateway fan-out.
pub const CHANNEL_MARKET_TICKS: &str = "market:ticks";

/// TTL on the latest-price and latest-tick keys.
pub const PRICE_TTL: Duration = Duration::from_secs(300);

/// TTL on the portfolio snapshot key.
pub const SNAPSHOT_TTL: Duration = Duration::from_secs(60);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_namespacing() {
        assert_eq!(price_latest("BTCUSDT"), "price:latest:BTCUSDT");
        assert_eq!(tick_latest("ETHUSDT"), "tick:latest:ETHUSDT");
    }
}
