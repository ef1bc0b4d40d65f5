use crate::{
    killswitch::KillSwitch,
    ledger::PortfolioLedger,
    monitor::{EquityMonitor, TripReason},
    validation::SignalValidator,
};
use chrono::Utc;
use marlin_bus::{Cache, EventBus, SharedBus, SharedCache, keys};
use marlin_core::{
    EventEnvelope, KillSwitchEvent, MarlinEvent, PortfolioSnapshot, RiskAlert, RiskLimits, Topic,
    TradeSignal,
};
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use std::{sync::Arc, time::Duration};
use tracing::{error, info, warn};
use uuid::Uuid;

const SOURCE: &str = "risk";
const DEFAULT_SNAPSHOT_CADENCE: Duration = Duration::from_secs(2);
const REJECTION_SEVERITY: Decimal = Decimal::from_parts(5, 0, 0, false, 1); // 0.5

/// Operator-facing handle over the kill switch.
///
/// Deactivation is manual only; it clears peak tracking and the rolling
/// loss window so the next session starts clean.
#[derive(Clone)]
pub struct RiskControl {
    bus: SharedBus,
    kill_switch: Arc<KillSwitch>,
    monitor: Arc<Mutex<EquityMonitor>>,
}

impl std::fmt::Debug for RiskControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiskControl")
            .field("active", &self.kill_switch.is_active())
            .finish()
    }
}

impl RiskControl {
    pub fn is_active(&self) -> bool {
        self.kill_switch.is_active()
    }

    /// Activate the kill switch; a no-op (and no event) when already active.
    pub fn activate(&self, reason: &str) -> bool {
        if !self.kill_switch.activate() {
            return false;
        }
        let drawdown = self.monitor.lock().drawdown_percent();
        error!(reason, drawdown = %drawdown, "kill switch ACTIVE, all new orders blocked");
        publish_kill_event(&self.bus, true, reason, drawdown);
        true
    }

    /// Manually deactivate; clears the monitor state.
    pub fn deactivate(&self) -> bool {
        if !self.kill_switch.deactivate() {
            return false;
        }
        self.monitor.lock().reset();
        info!("kill switch deactivated by operator");
        publish_kill_event(&self.bus, false, "Manual reset", Decimal::ZERO);
        true
    }
}

fn publish_kill_event(bus: &SharedBus, active: bool, reason: &str, drawdown: Decimal) {
    let event = MarlinEvent::KillSwitch(KillSwitchEvent {
        active,
        reason: reason.to_string(),
        drawdown_percent: drawdown,
        time: Utc::now(),
    });
    if let Err(publish_error) =
        bus.publish(EventEnvelope::new(event, Uuid::new_v4().to_string(), SOURCE))
    {
        warn!(%publish_error, "failed to publish kill switch event");
    }
}

/// The risk manager service.
///
/// Gates every `strategy.signal` through the validation pipeline, maintains
/// the portfolio ledger from fills and ticks, publishes snapshots to cache,
/// and trips the kill switch on monitor breaches.
pub struct RiskManager {
    bus: SharedBus,
    cache: SharedCache,
    limits: Arc<RwLock<RiskLimits>>,
    kill_switch: Arc<KillSwitch>,
    monitor: Arc<Mutex<EquityMonitor>>,
    validator: SignalValidator,
    ledger: PortfolioLedger,
    initial_equity: Decimal,
    snapshot_cadence: Duration,
    publish_snapshots: bool,
    last_snapshot: Option<PortfolioSnapshot>,
}

impl std::fmt::Debug for RiskManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiskManager")
            .field("kill_switch_active", &self.kill_switch.is_active())
            .field("snapshot_cadence", &self.snapshot_cadence)
            .finish()
    }
}

impl RiskManager {
    pub fn new(
        bus: SharedBus,
        cache: SharedCache,
        limits: RiskLimits,
        initial_equity: Decimal,
    ) -> Self {
        Self {
            bus: bus.clone(),
            cache,
            limits: Arc::new(RwLock::new(limits)),
            kill_switch: Arc::new(KillSwitch::new()),
            monitor: Arc::new(Mutex::new(EquityMonitor::new())),
            validator: SignalValidator::default(),
            ledger: PortfolioLedger::new(initial_equity),
            initial_equity,
            snapshot_cadence: DEFAULT_SNAPSHOT_CADENCE,
            publish_snapshots: true,
            last_snapshot: None,
        }
    }

    pub fn with_snapshot_cadence(mut self, cadence: Duration) -> Self {
        self.snapshot_cadence = cadence;
        self
    }

    /// Disable the ledger-driven snapshot writer; the monitor then feeds
    /// purely on snapshots some other component places in cache.
    pub fn without_snapshot_publishing(mut self) -> Self {
        self.publish_snapshots = false;
        self
    }

    /// Handle for the operator surface; share before calling `run`.
    pub fn control(&self) -> RiskControl {
        RiskControl {
            bus: self.bus.clone(),
            kill_switch: Arc::clone(&self.kill_switch),
            monitor: Arc::clone(&self.monitor),
        }
    }

    /// Mutable view of the limits, shared with the operator surface.
    pub fn limits(&self) -> Arc<RwLock<RiskLimits>> {
        Arc::clone(&self.limits)
    }

    /// Run until shutdown.
    pub async fn run(mut self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let mut signals = self.bus.subscribe(Topic::StrategySignal);
        let mut fills = self.bus.subscribe(Topic::OrdersExecuted);
        let mut ticks = self.bus.subscribe(Topic::MarketTick);
        let mut cadence = tokio::time::interval(self.snapshot_cadence);
        info!(cadence = ?self.snapshot_cadence, "risk manager started");

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return;
                    }
                }
                _ = cadence.tick() => self.on_cadence().await,
                event = signals.recv() => {
                    let Some(event) = event else { return };
                    if let MarlinEvent::TradeSignal(signal) = &event.payload {
                        self.on_signal(signal);
                    }
                }
                event = fills.recv() => {
                    let Some(event) = event else { return };
                    if let MarlinEvent::OrderExecuted(order) = &event.payload {
                        self.ledger.apply_fill(order);
                    }
                }
                event = ticks.recv() => {
                    let Some(event) = event else { return };
                    if let MarlinEvent::MarketTick(tick) = &event.payload {
                        self.ledger.mark(&tick.symbol, tick.price);
                    }
                }
            }
        }
    }

    /// Snapshot cadence: publish the ledger view, then feed whatever
    /// snapshot the cache now holds into the equity monitor.
    async fn on_cadence(&mut self) {
        if self.publish_snapshots {
            let drawdown = self.monitor.lock().drawdown_percent();
            let snapshot = self.ledger.snapshot(drawdown, Utc::now());
            match serde_json::to_string(&snapshot) {
                Ok(json) => {
                    if let Err(cache_error) = self
                        .cache
                        .set(keys::PORTFOLIO_SNAPSHOT, json, Some(keys::SNAPSHOT_TTL))
                        .await
                    {
                        warn!(%cache_error, "portfolio snapshot write failed");
                    }
                }
                Err(serialise_error) => {
                    warn!(%serialise_error, "portfolio snapshot serialisation failed")
                }
            }
        }

        let raw = match self.cache.get(keys::PORTFOLIO_SNAPSHOT).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(cache_error) => {
                warn!(%cache_error, "portfolio snapshot read failed");
                return;
            }
        };

        let snapshot: PortfolioSnapshot = match serde_json::from_str(&raw) {
            Ok(snapshot) => snapshot,
            Err(parse_error) => {
                warn!(%parse_error, "malformed portfolio snapshot ignored");
                return;
            }
        };

        let limits = self.limits.read().clone();
        let trip = self.monitor.lock().observe(&snapshot, &limits);
        self.last_snapshot = Some(snapshot);

        if let Some(reason) = trip {
            self.trip(reason, &limits);
        }
    }

    fn trip(&self, reason: TripReason, limits: &RiskLimits) {
        if !limits.kill_switch_enabled {
            warn!(reason = %reason.reason(), "kill switch disabled by config, breach ignored");
            return;
        }
        if !self.kill_switch.activate() {
            return;
        }

        let drawdown = self.monitor.lock().drawdown_percent();
        error!(
            reason = %reason.reason(),
            drawdown = %drawdown,
            "kill switch TRIPPED, all new orders blocked"
        );
        publish_kill_event(&self.bus, true, &reason.reason(), drawdown);
    }

    fn on_signal(&mut self, signal: &TradeSignal) {
        let limits = self.limits.read().clone();
        let snapshot = self
            .last_snapshot
            .clone()
            .unwrap_or_else(|| PortfolioSnapshot::flat(self.initial_equity));

        match self.validator.validate(
            signal,
            &limits,
            self.kill_switch.is_active(),
            &snapshot,
        ) {
            Ok(order) => {
                info!(
                    symbol = %order.symbol,
                    side = ?order.side,
                    quantity = %order.quantity,
                    "signal approved"
                );
                let correlation_id = order.correlation_id.to_string();
                let event = MarlinEvent::OrderApproved(order);
                if let Err(publish_error) =
                    self.bus
                        .publish(EventEnvelope::new(event, correlation_id, SOURCE))
                {
                    warn!(%publish_error, "order approval publish failed");
                }
            }
            Err(rejection) => {
                let reason = rejection.reason();
                info!(symbol = %signal.symbol, reason = %reason, "signal rejected");
                let event = MarlinEvent::RiskAlert(RiskAlert {
                    symbol: Some(signal.symbol.clone()),
                    reason,
                    severity: REJECTION_SEVERITY,
                    correlation_id: Some(signal.correlation_id),
                    time: Utc::now(),
                });
                if let Err(publish_error) = self.bus.publish(EventEnvelope::new(
                    event,
                    signal.correlation_id.to_string(),
                    SOURCE,
                )) {
                    warn!(%publish_error, "risk alert publish failed");
                }
            }
        }
    }
}
