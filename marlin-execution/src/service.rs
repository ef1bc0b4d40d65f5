use crate::{
    adapter::{OrderAdapter, OrderReceipt},
    tracker::OrderTracker,
};
use chrono::Utc;
use marlin_bus::{EventBus, SharedBus};
use marlin_core::{
    EventEnvelope, HealthStatus, MarlinEvent, ModeProvider, Order, RiskAlert, Symbol,
    SystemHealthEvent, Topic, TradingMode,
};
use marlin_integration::CircuitBreaker;
use rust_decimal::Decimal;
use std::{sync::Arc, time::Duration};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

const SOURCE: &str = "execution";
const FAILURE_SEVERITY: Decimal = Decimal::from_parts(8, 0, 0, false, 1); // 0.8
const DEFAULT_MONITOR_CADENCE: Duration = Duration::from_secs(5);
const DEFAULT_ORDER_TIMEOUT: Duration = Duration::from_secs(60);
const LIVE_CIRCUIT_THRESHOLD: u32 = 5;
const LIVE_CIRCUIT_COOLDOWN: Duration = Duration::from_secs(30);

/// The execution engine service.
///
/// Subscribes to `orders.approved`, places orders through the adapter for
/// the current trading mode, folds results into the order tracker, and
/// emits `orders.executed`. A pending-order monitor re-queries working
/// orders and cancels those older than the configured timeout. Repeated
/// transient live failures open a circuit that flips the mode to paper.
pub struct ExecutionService {
    bus: SharedBus,
    mode: Arc<ModeProvider>,
    live: Option<Arc<dyn OrderAdapter>>,
    paper: Arc<dyn OrderAdapter>,
    live_circuit: Arc<CircuitBreaker>,
    auto_fallback: bool,
    tracker: Arc<OrderTracker>,
    order_timeout: Duration,
    monitor_cadence: Duration,
}

impl std::fmt::Debug for ExecutionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionService")
            .field("mode", &self.mode.mode())
            .field("live", &self.live.as_ref().map(|adapter| adapter.name()))
            .field("order_timeout", &self.order_timeout)
            .finish()
    }
}

impl ExecutionService {
    pub fn new(bus: SharedBus, mode: Arc<ModeProvider>, paper: Arc<dyn OrderAdapter>) -> Self {
        Self {
            bus,
            mode,
            live: None,
            paper,
            live_circuit: Arc::new(CircuitBreaker::new(
                "live-adapter",
                LIVE_CIRCUIT_THRESHOLD,
                LIVE_CIRCUIT_COOLDOWN,
            )),
            auto_fallback: true,
            tracker: Arc::new(OrderTracker::new()),
            order_timeout: DEFAULT_ORDER_TIMEOUT,
            monitor_cadence: DEFAULT_MONITOR_CADENCE,
        }
    }

    pub fn with_live_adapter(mut self, adapter: Arc<dyn OrderAdapter>) -> Self {
        self.live = Some(adapter);
        self
    }

    pub fn with_order_timeout(mut self, timeout: Duration) -> Self {
        self.order_timeout = timeout;
        self
    }

    pub fn with_monitor_cadence(mut self, cadence: Duration) -> Self {
        self.monitor_cadence = cadence;
        self
    }

    pub fn with_auto_fallback(mut self, auto_fallback: bool) -> Self {
        self.auto_fallback = auto_fallback;
        self
    }

    /// Shared view of tracked orders and positions.
    pub fn tracker(&self) -> Arc<OrderTracker> {
        Arc::clone(&self.tracker)
    }

    pub fn live_circuit(&self) -> Arc<CircuitBreaker> {
        Arc::clone(&self.live_circuit)
    }

    fn adapter_for(&self, mode: TradingMode) -> Arc<dyn OrderAdapter> {
        match mode {
            TradingMode::Live => match &self.live {
                Some(live) => Arc::clone(live),
                None => {
                    warn!("live mode with no live adapter configured, using paper");
                    Arc::clone(&self.paper)
                }
            },
            _ => Arc::clone(&self.paper),
        }
    }

    /// Run until shutdown.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut approvals = self.bus.subscribe(Topic::OrdersApproved);
        let mut monitor = tokio::time::interval(self.monitor_cadence);
        info!(mode = %self.mode.mode(), "execution engine started");

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return;
                    }
                }
                _ = monitor.tick() => self.reconcile_pending().await,
                event = approvals.recv() => {
                    let Some(event) = event else { return };
                    if let MarlinEvent::OrderApproved(order) = &event.payload {
                        self.place(order.clone()).await;
                    }
                }
            }
        }
    }

    /// Place one approved order, serialised per symbol.
    pub async fn place(&self, order: Order) {
        let symbol_lock = self.tracker.symbol_lock(&order.symbol);
        let _guard = symbol_lock.lock().await;

        self.tracker.insert(order.clone());
        let mode = self.mode.mode();
        let adapter = self.adapter_for(mode);

        match adapter.place_order(&order).await {
            Ok(receipt) => {
                if mode == TradingMode::Live && self.live_circuit.record_success() {
                    self.publish_health(HealthStatus::Healthy, "live adapter recovered");
                }
                if let Some((updated, _)) = self.tracker.apply_receipt(&order.id, &receipt) {
                    info!(
                        symbol = %updated.symbol,
                        status = updated.status.as_str(),
                        exchange_id = updated.exchange_id.as_deref().unwrap_or("-"),
                        "order placed"
                    );
                    self.publish_executed(updated);
                }
            }
            Err(error) => {
                warn!(symbol = %order.symbol, %error, adapter = adapter.name(), "order placement failed");
                self.tracker.apply_receipt(&order.id, &OrderReceipt::rejected());
                self.publish_alert(&order, format!("Order placement failed: {error}"));

                if mode == TradingMode::Live
                    && error.is_transient()
                    && self.live_circuit.record_failure()
                {
                    self.on_live_circuit_open();
                }
            }
        }
    }

    fn on_live_circuit_open(&self) {
        if self.auto_fallback {
            self.mode.set(TradingMode::Paper, "live adapter circuit open");
            self.publish_health(
                HealthStatus::Degraded,
                "live adapter circuit open, orders routed to paper",
            );
        } else {
            self.publish_health(HealthStatus::Degraded, "live adapter circuit open");
        }
    }

    /// Re-query working orders; cancel those past the timeout.
    async fn reconcile_pending(&self) {
        let pending = self.tracker.pending_orders();
        if pending.is_empty() {
            return;
        }

        let adapter = self.adapter_for(self.mode.mode());
        let now = Utc::now();

        for order in pending {
            let age = (now - order.created_at)
                .to_std()
                .unwrap_or(Duration::ZERO);

            if age >= self.order_timeout {
                warn!(symbol = %order.symbol, order_id = %order.id, "pending order timed out, cancelling");
                let receipt = match adapter.cancel_order(&order).await {
                    Ok(receipt) if receipt.status.is_terminal() => receipt,
                    Ok(_) => OrderReceipt::canceled(),
                    Err(error) => {
                        warn!(%error, "venue cancel failed, marking canceled locally");
                        OrderReceipt::canceled()
                    }
                };
                if let Some((updated, terminal)) = self.tracker.apply_receipt(&order.id, &receipt)
                {
                    if terminal {
                        self.publish_executed(updated);
                    }
                }
                continue;
            }

            match adapter.query_order(&order).await {
                Ok(receipt) => {
                    if let Some((updated, terminal)) =
                        self.tracker.apply_receipt(&order.id, &receipt)
                    {
                        if terminal {
                            self.publish_executed(updated);
                        }
                    }
                }
                Err(error) => {
                    debug!(symbol = %order.symbol, %error, "pending order query failed");
                }
            }
        }
    }

    fn publish_executed(&self, order: Order) {
        let correlation_id = order.correlation_id.to_string();
        if let Err(publish_error) = self.bus.publish(EventEnvelope::new(
            MarlinEvent::OrderExecuted(order),
            correlation_id,
            SOURCE,
        )) {
            warn!(%publish_error, "order executed publish failed");
        }
    }

    fn publish_alert(&self, order: &Order, reason: String) {
        let event = MarlinEvent::RiskAlert(RiskAlert {
            symbol: Some(order.symbol.clone()),
            reason,
            severity: FAILURE_SEVERITY,
            correlation_id: Some(order.correlation_id),
            time: Utc::now(),
        });
        if let Err(publish_error) = self.bus.publish(EventEnvelope::new(
            event,
            order.correlation_id.to_string(),
            SOURCE,
        )) {
            warn!(%publish_error, "risk alert publish failed");
        }
    }

    fn publish_health(&self, status: HealthStatus, detail: &str) {
        let event = MarlinEvent::SystemHealth(SystemHealthEvent {
            component: Symbol::new("execution"),
            status,
            detail: detail.to_string(),
            time: Utc::now(),
        });
        if let Err(publish_error) =
            self.bus
                .publish(EventEnvelope::new(event, Uuid::new_v4().to_string(), SOURCE))
        {
            warn!(%publish_error, "health publish failed");
        }
    }
}
