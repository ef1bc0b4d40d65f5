use marlin_bus::{Cache, EventBus, InMemoryBus, InMemoryCache, keys};
use marlin_core::{MarlinEvent, Symbol, Topic};
use marlin_data::{IngestionService, MarketDataProvider, SimulationProvider};
use std::{sync::Arc, time::Duration};
use tokio::sync::watch;

#[tokio::test]
async fn replayed_ticks_reach_bus_cache_and_fanout_channel() {
    let bus = Arc::new(InMemoryBus::new());
    let cache = Arc::new(InMemoryCache::new());
    let symbols = vec![Symbol::new("BTCUSDT")];

    let mut ticks = bus.subscribe(Topic::MarketTick);
    let mut fanout = cache.subscribe_channels();

    let provider: Arc<dyn MarketDataProvider> = Arc::new(
        SimulationProvider::new(42)
            .with_steps(5)
            .with_emit_interval(Duration::from_millis(1))
            .one_shot(),
    );

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let service = IngestionService::new(
        bus.clone(),
        cache.clone(),
        symbols.clone(),
        provider,
        None,
    );

    tokio::time::timeout(Duration::from_secs(5), service.run(shutdown_rx))
        .await
        .expect("ingestion run should complete a one-shot replay");

    // All five ticks arrive in order on the bus.
    let mut prices = Vec::new();
    for _ in 0..5 {
        let event = ticks.recv().await.expect("tick event");
        assert_eq!(event.source.as_str(), "ingestion");
        match &event.payload {
            MarlinEvent::MarketTick(tick) => prices.push(tick.price),
            other => panic!("unexpected payload: {other:?}"),
        }
    }
    assert_eq!(prices.len(), 5);

    // The cache holds the final price, formatted to eight decimal places.
    let cached = cache
        .get(&keys::price_latest("BTCUSDT"))
        .await
        .unwrap()
        .expect("latest price cached");
    assert_eq!(cached, format!("{:.8}", prices[4]));
    assert!(cached.split('.').next_back().unwrap().len() == 8);

    let cached_tick = cache
        .get(&keys::tick_latest("BTCUSDT"))
        .await
        .unwrap()
        .expect("latest tick cached");
    assert!(cached_tick.contains("\"symbol\":\"BTCUSDT\""));

    // Gateway fan-out observed on the market:ticks channel.
    let (channel, payload) = fanout.recv().await.unwrap();
    assert_eq!(channel, keys::CHANNEL_MARKET_TICKS);
    assert!(payload.contains("BTCUSDT"));
}

#[tokio::test]
async fn shutdown_stops_a_looping_replay() {
    let bus = Arc::new(InMemoryBus::new());
    let cache = Arc::new(InMemoryCache::new());

    let provider: Arc<dyn MarketDataProvider> = Arc::new(
        SimulationProvider::new(7)
            .with_steps(1_000)
            .with_emit_interval(Duration::from_millis(1)),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let service = IngestionService::new(
        bus,
        cache,
        vec![Symbol::new("BTCUSDT")],
        provider,
        None,
    );

    let handle = tokio::spawn(service.run(shutdown_rx));
    tokio::time::sleep(Duration::from_millis(20)).await;
    shutdown_tx.send(true).unwrap();

    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("service should stop on shutdown")
        .unwrap();
}
