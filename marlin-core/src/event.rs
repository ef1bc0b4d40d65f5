use crate::{Candle, CoreError, MarketTick, Order, Symbol, TradeSignal};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// The fixed set of bus topics.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Topic {
    MarketTick,
    CandleClosed,
    StrategySignal,
    OrdersApproved,
    OrdersExecuted,
    RiskAlerts,
    KillSwitch,
    SystemHealth,
}

impl Topic {
    pub const ALL: [Topic; 8] = [
        Topic::MarketTick,
        Topic::CandleClosed,
        Topic::StrategySignal,
        Topic::OrdersApproved,
        Topic::OrdersExecuted,
        Topic::RiskAlerts,
        Topic::KillSwitch,
        Topic::SystemHealth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MarketTick => "market.tick",
            Self::CandleClosed => "candle.closed",
            Self::StrategySignal => "strategy.signal",
            Self::OrdersApproved => "orders.approved",
            Self::OrdersExecuted => "orders.executed",
            Self::RiskAlerts => "risk.alerts",
            Self::KillSwitch => "killswitch",
            Self::SystemHealth => "system.health",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = CoreError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Topic::ALL
            .into_iter()
            .find(|topic| topic.as_str() == name)
            .ok_or_else(|| CoreError::InvalidTopic(name.to_string()))
    }
}

/// Operational alert raised by risk validation or execution failures.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAlert {
    pub symbol: Option<Symbol>,
    pub reason: String,
    /// Severity in [0, 1]; validation rejections are informational, adapter
    /// failures are published at 0.8.
    pub severity: Decimal,
    pub correlation_id: Option<Uuid>,
    pub time: DateTime<Utc>,
}

/// Published exactly once per kill-switch state change.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KillSwitchEvent {
    pub active: bool,
    pub reason: String,
    pub drawdown_percent: Decimal,
    pub time: DateTime<Utc>,
}

/// Component health, fanned out to operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemHealthEvent {
    pub component: Symbol,
    pub status: HealthStatus,
    pub detail: String,
    pub time: DateTime<Utc>,
}

/// Every event the pipeline can carry. Serialises as the bare payload object;
/// the owning topic travels out-of-band (channel name on the remote bus).
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(untagged)]
pub enum MarlinEvent {
    MarketTick(MarketTick),
    CandleClosed(Candle),
    TradeSignal(TradeSignal),
    OrderApproved(Order),
    OrderExecuted(Order),
    RiskAlert(RiskAlert),
    KillSwitch(KillSwitchEvent),
    SystemHealth(SystemHealthEvent),
}

impl MarlinEvent {
    pub fn topic(&self) -> Topic {
        match self {
            Self::MarketTick(_) => Topic::MarketTick,
            Self::CandleClosed(_) => Topic::CandleClosed,
            Self::TradeSignal(_) => Topic::StrategySignal,
            Self::OrderApproved(_) => Topic::OrdersApproved,
            Self::OrderExecuted(_) => Topic::OrdersExecuted,
            Self::RiskAlert(_) => Topic::RiskAlerts,
            Self::KillSwitch(_) => Topic::KillSwitch,
            Self::SystemHealth(_) => Topic::SystemHealth,
        }
    }

    /// Decode a payload received on `topic` back into the typed event.
    pub fn from_topic_value(
        topic: Topic,
        payload: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        Ok(match topic {
            Topic::MarketTick => Self::MarketTick(serde_json::from_value(payload)?),
            Topic::CandleClosed => Self::CandleClosed(serde_json::from_value(payload)?),
            Topic::StrategySignal => Self::TradeSignal(serde_json::from_value(payload)?),
            Topic::OrdersApproved => Self::OrderApproved(serde_json::from_value(payload)?),
            Topic::OrdersExecuted => Self::OrderExecuted(serde_json::from_value(payload)?),
            Topic::RiskAlerts => Self::RiskAlert(serde_json::from_value(payload)?),
            Topic::KillSwitch => Self::KillSwitch(serde_json::from_value(payload)?),
            Topic::SystemHealth => Self::SystemHealth(serde_json::from_value(payload)?),
        })
    }
}

/// Wire envelope carried on every topic: the payload plus correlation id,
/// RFC 3339 UTC timestamp, and the publishing service's name.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub payload: T,
    pub correlation_id: String,
    pub timestamp: DateTime<Utc>,
    pub source: Symbol,
}

/// Envelope specialised to the typed event set, as dispatched in-process.
pub type EventEnvelope = Envelope<MarlinEvent>;

impl EventEnvelope {
    pub fn new(payload: MarlinEvent, correlation_id: impl Into<String>, source: &str) -> Self {
        Self {
            payload,
            correlation_id: correlation_id.into(),
            timestamp: Utc::now(),
            source: Symbol::new(source),
        }
    }

    pub fn topic(&self) -> Topic {
        self.payload.topic()
    }

    /// Decode a JSON envelope received on `topic`.
    pub fn from_topic_json(topic: Topic, json: &str) -> Result<Self, serde_json::Error> {
        let raw: Envelope<serde_json::Value> = serde_json::from_str(json)?;
        Ok(Self {
            payload: MarlinEvent::from_topic_value(topic, raw.payload)?,
            correlation_id: raw.correlation_id,
            timestamp: raw.timestamp,
            source: raw.source,
        })
    }
}
