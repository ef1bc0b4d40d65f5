use crate::{
    error::DataError,
    provider::{MarketDataProvider, shutdown_requested},
};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use marlin_core::{MarketTick, Symbol};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rust_decimal::Decimal;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::info;

/// Synthetic clock origin; fixed so replays are reproducible bit-for-bit.
const REPLAY_EPOCH_MS: i64 = 1_704_067_200_000; // 2024-01-01T00:00:00Z

const DEFAULT_STEPS: usize = 500;
const BASE_PRICE: i64 = 50_000;

/// Deterministic replay provider for simulation and backtest modes.
///
/// Prices follow a seeded random walk in basis points around a fixed base,
/// with synthetic timestamps advancing one emit interval per step. The same
/// seed always yields the same tick sequence. Loops indefinitely unless
/// configured one-shot.
#[derive(Debug, Clone)]
pub struct SimulationProvider {
    seed: u64,
    emit_interval: Duration,
    steps: usize,
    one_shot: bool,
}

impl SimulationProvider {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            emit_interval: Duration::from_millis(100),
            steps: DEFAULT_STEPS,
            one_shot: false,
        }
    }

    pub fn with_emit_interval(mut self, emit_interval: Duration) -> Self {
        self.emit_interval = emit_interval;
        self
    }

    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    pub fn one_shot(mut self) -> Self {
        self.one_shot = true;
        self
    }

    /// The full deterministic tick sequence for one pass over `symbols`.
    pub fn generate(&self, symbols: &[Symbol]) -> Vec<MarketTick> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut prices: Vec<Decimal> = (0..symbols.len())
            .map(|index| Decimal::from(BASE_PRICE) / Decimal::from(index as u64 + 1))
            .collect();

        let step_ms = TimeDelta::milliseconds(self.emit_interval.as_millis() as i64);
        let mut time = DateTime::from_timestamp_millis(REPLAY_EPOCH_MS).unwrap_or_else(Utc::now);
        let mut ticks = Vec::with_capacity(self.steps * symbols.len());

        for _ in 0..self.steps {
            for (index, symbol) in symbols.iter().enumerate() {
                let basis_points: i64 = rng.random_range(-20..=20);
                let price = &mut prices[index];
                *price += *price * Decimal::from(basis_points) / Decimal::from(10_000);
                *price = price.round_dp(2);

                let volume = Decimal::from(rng.random_range(1..=500u32)) / Decimal::from(100);
                let half_spread = (*price / Decimal::from(10_000)).round_dp(2);

                ticks.push(MarketTick::new(
                    symbol.clone(),
                    *price,
                    volume,
                    *price - half_spread,
                    *price + half_spread,
                    time,
                ));
            }
            time += step_ms;
        }

        ticks
    }
}

#[async_trait]
impl MarketDataProvider for SimulationProvider {
    fn name(&self) -> &'static str {
        "simulation"
    }

    async fn run(
        &self,
        symbols: &[Symbol],
        tx: mpsc::UnboundedSender<MarketTick>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), DataError> {
        info!(seed = self.seed, steps = self.steps, one_shot = self.one_shot, "replay started");

        loop {
            for tick in self.generate(symbols) {
                if shutdown_requested(&shutdown) {
                    return Ok(());
                }
                if tx.send(tick).is_err() {
                    return Err(DataError::ConsumerClosed);
                }

                tokio::select! {
                    _ = shutdown.changed() => {
                        if shutdown_requested(&shutdown) {
                            return Ok(());
                        }
                    }
                    _ = tokio::time::sleep(self.emit_interval) => {}
                }
            }

            if self.one_shot {
                return Ok(());
            }
        }
    }
}
