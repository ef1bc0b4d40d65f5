use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    str::FromStr,
    sync::atomic::{AtomicU8, Ordering},
};
use tracing::info;

/// Process-wide trading mode.
///
/// `Live` and `Paper` may flip at runtime under the circuit-breaker fallback
/// policy; `Backtest` and `Simulation` are fixed at start-up.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub enum TradingMode {
    Live,
    Paper,
    Backtest,
    Simulation,
}

impl TradingMode {
    fn as_u8(self) -> u8 {
        match self {
            Self::Live => 0,
            Self::Paper => 1,
            Self::Backtest => 2,
            Self::Simulation => 3,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Live,
            1 => Self::Paper,
            2 => Self::Backtest,
            _ => Self::Simulation,
        }
    }
}

impl fmt::Display for TradingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Live => "Live",
            Self::Paper => "Paper",
            Self::Backtest => "Backtest",
            Self::Simulation => "Simulation",
        };
        f.write_str(label)
    }
}

impl FromStr for TradingMode {
    type Err = CoreError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        match label.to_ascii_lowercase().as_str() {
            "live" => Ok(Self::Live),
            "paper" => Ok(Self::Paper),
            "backtest" => Ok(Self::Backtest),
            "simulation" => Ok(Self::Simulation),
            other => Err(CoreError::InvalidTradingMode(other.to_string())),
        }
    }
}

/// Single-writer holder of the process-wide [`TradingMode`].
///
/// Reads are lock-free atomic loads; writes log the transition. Callers that
/// flip the mode are expected to announce it on the bus themselves.
#[derive(Debug)]
pub struct ModeProvider {
    mode: AtomicU8,
}

impl ModeProvider {
    pub fn new(initial: TradingMode) -> Self {
        Self {
            mode: AtomicU8::new(initial.as_u8()),
        }
    }

    pub fn mode(&self) -> TradingMode {
        TradingMode::from_u8(self.mode.load(Ordering::Relaxed))
    }

    /// Switch modes, returning the previous mode. A no-op transition is not logged.
    pub fn set(&self, next: TradingMode, reason: &str) -> TradingMode {
        let previous = TradingMode::from_u8(self.mode.swap(next.as_u8(), Ordering::Relaxed));
        if previous != next {
            info!(from = %previous, to = %next, reason, "trading mode transition");
        }
        previous
    }
}
