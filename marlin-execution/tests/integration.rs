use marlin_bus::{Cache, EventBus, InMemoryBus, InMemoryCache, keys};
use marlin_core::{
    EventEnvelope, HealthStatus, MarlinEvent, ModeProvider, Order, OrderStatus, Side, Symbol,
    Topic, TradingMode,
};
use marlin_execution::{
    AdapterError, ExecutionService, FakeAdapter, OrderAdapter, OrderReceipt, PaperAdapter,
};
use marlin_integration::TransportError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::{sync::Arc, time::Duration};
use tokio::sync::watch;
use uuid::Uuid;

fn approved_order(quantity: Decimal) -> Order {
    Order::market(Symbol::new("BTCUSDT"), Side::Buy, quantity, Uuid::new_v4())
}

fn transient_error() -> AdapterError {
    AdapterError::Transport(TransportError::HttpResponse(
        reqwest::StatusCode::INTERNAL_SERVER_ERROR,
        "upstream unavailable".to_string(),
    ))
}

#[tokio::test]
async fn paper_fill_flows_from_approval_to_executed_event() {
    let bus = Arc::new(InMemoryBus::new());
    let cache = Arc::new(InMemoryCache::new());
    cache
        .set(&keys::price_latest("BTCUSDT"), "50000".to_string(), None)
        .await
        .unwrap();

    let mut executed = bus.subscribe(Topic::OrdersExecuted);

    let mode = Arc::new(ModeProvider::new(TradingMode::Paper));
    let paper: Arc<dyn OrderAdapter> = Arc::new(PaperAdapter::new(cache, Duration::ZERO));
    let service = ExecutionService::new(bus.clone(), mode, paper);
    let tracker = service.tracker();

    let order = approved_order(dec!(0.5));
    let correlation = order.correlation_id;
    service.place(order).await;

    let event = tokio::time::timeout(Duration::from_secs(2), executed.recv())
        .await
        .expect("executed event")
        .unwrap();
    match &event.payload {
        MarlinEvent::OrderExecuted(order) => {
            assert_eq!(order.status, OrderStatus::Filled);
            assert_eq!(order.filled_quantity, dec!(0.5));
            assert_eq!(order.filled_price, dec!(50000));
            assert!(order.exchange_id.as_deref().unwrap().starts_with("PAPER-"));
            assert_eq!(event.correlation_id, correlation.to_string());
        }
        other => panic!("unexpected payload: {other:?}"),
    }

    let position = tracker.position(&Symbol::new("BTCUSDT")).unwrap();
    assert_eq!(position.quantity, dec!(0.5));
}

#[tokio::test]
async fn five_live_failures_flip_mode_to_paper() {
    let bus = Arc::new(InMemoryBus::new());
    let cache = Arc::new(InMemoryCache::new());
    cache
        .set(&keys::price_latest("BTCUSDT"), "50000".to_string(), None)
        .await
        .unwrap();

    let mut health = bus.subscribe(Topic::SystemHealth);
    let mut alerts = bus.subscribe(Topic::RiskAlerts);

    let live = Arc::new(FakeAdapter::new(dec!(50000)));
    for _ in 0..5 {
        live.push_response(Err(transient_error()));
    }

    let mode = Arc::new(ModeProvider::new(TradingMode::Live));
    let paper: Arc<dyn OrderAdapter> = Arc::new(PaperAdapter::new(cache, Duration::ZERO));
    let service = ExecutionService::new(bus.clone(), Arc::clone(&mode), paper)
        .with_live_adapter(live.clone());

    for _ in 0..5 {
        service.place(approved_order(dec!(0.1))).await;
    }

    // Circuit open after five consecutive transient failures.
    assert_eq!(mode.mode(), TradingMode::Paper);
    let event = tokio::time::timeout(Duration::from_secs(2), health.recv())
        .await
        .expect("health event")
        .unwrap();
    match &event.payload {
        MarlinEvent::SystemHealth(health) => {
            assert_eq!(health.status, HealthStatus::Degraded);
            assert!(health.detail.contains("circuit open"));
        }
        other => panic!("unexpected payload: {other:?}"),
    }

    // Every failure raised an alert at severity 0.8.
    for _ in 0..5 {
        let alert = alerts.recv().await.unwrap();
        match &alert.payload {
            MarlinEvent::RiskAlert(alert) => {
                assert_eq!(alert.severity, dec!(0.8));
                assert!(alert.reason.contains("placement failed"));
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    // Subsequent orders fill on paper with synthetic exchange ids.
    let mut executed = bus.subscribe(Topic::OrdersExecuted);
    service.place(approved_order(dec!(0.1))).await;
    let event = tokio::time::timeout(Duration::from_secs(2), executed.recv())
        .await
        .expect("paper fill after fallback")
        .unwrap();
    match &event.payload {
        MarlinEvent::OrderExecuted(order) => {
            assert!(order.exchange_id.as_deref().unwrap().starts_with("PAPER-"));
        }
        other => panic!("unexpected payload: {other:?}"),
    }
    assert_eq!(live.call_count(), 5);
}

#[tokio::test]
async fn venue_rejection_does_not_open_the_circuit() {
    let bus = Arc::new(InMemoryBus::new());

    let live = Arc::new(FakeAdapter::new(dec!(50000)));
    for _ in 0..6 {
        live.push_response(Err(AdapterError::Exchange(
            "Account has insufficient balance".to_string(),
        )));
    }

    let mode = Arc::new(ModeProvider::new(TradingMode::Live));
    let paper: Arc<dyn OrderAdapter> = Arc::new(FakeAdapter::new(dec!(50000)));
    let service = ExecutionService::new(bus.clone(), Arc::clone(&mode), paper)
        .with_live_adapter(live.clone());

    for _ in 0..6 {
        service.place(approved_order(dec!(0.1))).await;
    }

    assert_eq!(mode.mode(), TradingMode::Live);
    assert!(!service.live_circuit().is_open());
}

#[tokio::test]
async fn stale_pending_order_is_cancelled_by_the_monitor() {
    let bus = Arc::new(InMemoryBus::new());
    let mut executed = bus.subscribe(Topic::OrdersExecuted);

    let venue = Arc::new(FakeAdapter::new(dec!(50000)));
    // Placement leaves the order working at the venue, the monitor's cancel
    // then confirms it as canceled.
    venue.push_response(Ok(OrderReceipt {
        exchange_order_id: Some("FAKE-9".to_string()),
        status: OrderStatus::New,
        filled_quantity: Decimal::ZERO,
        filled_price: Decimal::ZERO,
        commission: Decimal::ZERO,
    }));
    venue.push_response(Ok(OrderReceipt::canceled()));

    let mode = Arc::new(ModeProvider::new(TradingMode::Paper));
    let paper: Arc<dyn OrderAdapter> = venue.clone();
    let service = ExecutionService::new(bus.clone(), mode, paper)
        .with_order_timeout(Duration::ZERO)
        .with_monitor_cadence(Duration::from_millis(20));

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let bus_for_publish = bus.clone();
    tokio::spawn(service.run(shutdown_rx));
    tokio::time::sleep(Duration::from_millis(30)).await;

    let order = approved_order(dec!(1));
    bus_for_publish
        .publish(EventEnvelope::new(
            MarlinEvent::OrderApproved(order),
            Uuid::new_v4().to_string(),
            "test",
        ))
        .unwrap();

    // First executed event reports the working order, the second the cancel.
    let first = tokio::time::timeout(Duration::from_secs(2), executed.recv())
        .await
        .expect("placement event")
        .unwrap();
    match &first.payload {
        MarlinEvent::OrderExecuted(order) => assert_eq!(order.status, OrderStatus::New),
        other => panic!("unexpected payload: {other:?}"),
    }

    let second = tokio::time::timeout(Duration::from_secs(2), executed.recv())
        .await
        .expect("cancel event")
        .unwrap();
    match &second.payload {
        MarlinEvent::OrderExecuted(order) => {
            assert_eq!(order.status, OrderStatus::Canceled);
        }
        other => panic!("unexpected payload: {other:?}"),
    }
}
