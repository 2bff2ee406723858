//! Integration tests for the price feed through its public API

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use ticker_feed::feed::{
    ConnectionHandle, Connector, Credentials, FeedController, FeedError, RetryPolicy,
    Subscription, SupervisorConfig, Symbol, TickerMessage, TickerSource,
};

/// Connector that opens local handles and can be told to fail
#[derive(Default)]
struct LocalConnector {
    opened: AtomicUsize,
    released: AtomicUsize,
    failures: Mutex<Vec<FeedError>>,
}

impl LocalConnector {
    fn failing_after_first(error: FeedError, times: usize) -> Self {
        Self {
            failures: Mutex::new(vec![error; times]),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Connector for LocalConnector {
    async fn open(&self, _credentials: &Credentials) -> Result<ConnectionHandle, FeedError> {
        let n = self.opened.fetch_add(1, Ordering::SeqCst);
        if n > 0 {
            if let Some(e) = self.failures.lock().unwrap().pop() {
                return Err(e);
            }
        }
        Ok(ConnectionHandle::new("http://local", "ws://local", true))
    }

    async fn release(&self, _handle: &ConnectionHandle) -> Result<(), FeedError> {
        self.released.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Per-symbol behaviour of the local ticker source
#[derive(Clone, Copy)]
enum Behaviour {
    Price(Decimal),
    Silent,
}

/// Ticker source answering from a fixed table
struct LocalSource {
    table: HashMap<Symbol, Behaviour>,
}

impl LocalSource {
    fn new(entries: &[(&str, Behaviour)]) -> Self {
        Self {
            table: entries
                .iter()
                .map(|(symbol, behaviour)| (Symbol::new(*symbol), *behaviour))
                .collect(),
        }
    }
}

struct LocalSubscription {
    symbol: Symbol,
    behaviour: Behaviour,
    delivered: bool,
}

#[async_trait]
impl TickerSource for LocalSource {
    async fn subscribe(
        &self,
        _handle: &ConnectionHandle,
        symbol: &Symbol,
    ) -> Result<Box<dyn Subscription>, FeedError> {
        let behaviour = self.table.get(symbol).copied().unwrap_or(Behaviour::Silent);
        Ok(Box::new(LocalSubscription {
            symbol: symbol.clone(),
            behaviour,
            delivered: false,
        }))
    }
}

#[async_trait]
impl Subscription for LocalSubscription {
    async fn recv(&mut self) -> Result<Option<TickerMessage>, FeedError> {
        match self.behaviour {
            Behaviour::Price(price) if !self.delivered => {
                self.delivered = true;
                Ok(Some(TickerMessage {
                    symbol: self.symbol.clone(),
                    price,
                    event_time: chrono::Utc::now(),
                }))
            }
            Behaviour::Price(_) => Ok(None),
            Behaviour::Silent => std::future::pending().await,
        }
    }

    async fn close(&mut self) {}
}

fn config() -> SupervisorConfig {
    SupervisorConfig::default()
        .socket_timeout(Duration::from_millis(40))
        .pass_interval(Duration::from_millis(5))
        .retry(
            RetryPolicy::default()
                .max_attempts(3)
                .initial_delay(Duration::from_millis(5))
                .max_delay(Duration::from_millis(20)),
        )
}

fn creds() -> Credentials {
    Credentials::new("key", "secret", "us")
}

async fn wait_for<F, Fut>(mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition().await {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn test_feed_publishes_every_symbol() {
    let source = LocalSource::new(&[
        ("BTCUSDT", Behaviour::Price(dec!(50000))),
        ("ETHUSDT", Behaviour::Price(dec!(3000))),
        ("BNBUSDT", Behaviour::Price(dec!(600))),
    ]);
    let connector = Arc::new(LocalConnector::default());
    let controller = FeedController::new(connector.clone(), Arc::new(source), config());
    let symbols = vec![
        Symbol::new("btcusdt"),
        Symbol::new("ETHUSDT"),
        Symbol::new("BNBUSDT"),
    ];

    controller.start(creds(), symbols).await.unwrap();
    let store = controller.store();
    let reader = &store;
    wait_for(move || async move { reader.len().await == 3 }).await;

    controller.stop().await.unwrap();

    let prices = store.prices().await;
    assert_eq!(prices[&Symbol::new("BTCUSDT")], dec!(50000));
    assert_eq!(prices[&Symbol::new("BNBUSDT")], dec!(600));
    assert_eq!(connector.opened.load(Ordering::SeqCst), 1);
    assert_eq!(connector.released.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_silent_symbol_triggers_reconnect_without_blocking_others() {
    let source = LocalSource::new(&[
        ("BTCUSDT", Behaviour::Silent),
        ("ETHUSDT", Behaviour::Price(dec!(3000))),
    ]);
    let connector = Arc::new(LocalConnector::default());
    let controller = FeedController::new(connector.clone(), Arc::new(source), config());

    controller
        .start(creds(), vec![Symbol::new("BTCUSDT"), Symbol::new("ETHUSDT")])
        .await
        .unwrap();

    let store = controller.store();
    let (reader, feed) = (&store, &controller);
    wait_for(move || async move { reader.get(&Symbol::new("ETHUSDT")).await.is_some() }).await;
    wait_for(move || async move { feed.stats().await.reconnects >= 2 }).await;

    controller.stop().await.unwrap();

    assert!(store.get(&Symbol::new("BTCUSDT")).await.is_none());
    let stats = controller.stats().await;
    assert!(stats.timed_out >= 2);
    // every handle ever opened has been released
    assert_eq!(
        connector.opened.load(Ordering::SeqCst),
        connector.released.load(Ordering::SeqCst)
    );
}

#[tokio::test]
async fn test_reconnect_gives_up_after_retry_cap() {
    let source = LocalSource::new(&[("BTCUSDT", Behaviour::Silent)]);
    let connector = Arc::new(LocalConnector::failing_after_first(
        FeedError::Network("unreachable".to_string()),
        10,
    ));
    let controller = FeedController::new(connector, Arc::new(source), config());

    controller
        .start(creds(), vec![Symbol::new("BTCUSDT")])
        .await
        .unwrap();
    let feed = &controller;
    wait_for(move || async move { !feed.is_running().await }).await;

    let result = controller.stop().await;
    assert_eq!(result, Err(FeedError::ReconnectExhausted { attempts: 3 }));
}

#[tokio::test]
async fn test_start_rejects_empty_symbol_list() {
    let controller = FeedController::new(
        Arc::new(LocalConnector::default()),
        Arc::new(LocalSource::new(&[])),
        config(),
    );

    let result = controller.start(creds(), Vec::new()).await;
    assert_eq!(result, Err(FeedError::NoSymbols));
    assert!(!controller.is_running().await);
}

#[tokio::test]
async fn test_stop_without_start_is_noop() {
    let controller = FeedController::new(
        Arc::new(LocalConnector::default()),
        Arc::new(LocalSource::new(&[])),
        config(),
    );
    assert_eq!(controller.stop().await, Ok(()));
}
