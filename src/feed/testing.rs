//! In-memory connector and ticker source for unit tests

use super::{ConnectionHandle, Connector, Credentials, FeedError, Subscription, Symbol, TickerMessage, TickerSource};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Connector that hands out fresh handles and can be told to fail
pub(crate) struct FakeConnector {
    opened: AtomicUsize,
    released: AtomicUsize,
    failures: Mutex<VecDeque<FeedError>>,
    always_fail: AtomicBool,
    release_error: bool,
    open_delay: Mutex<Duration>,
}

impl FakeConnector {
    pub(crate) fn new() -> Self {
        Self {
            opened: AtomicUsize::new(0),
            released: AtomicUsize::new(0),
            failures: Mutex::new(VecDeque::new()),
            always_fail: AtomicBool::new(false),
            release_error: false,
            open_delay: Mutex::new(Duration::ZERO),
        }
    }

    pub(crate) fn with_release_error(mut self) -> Self {
        self.release_error = true;
        self
    }

    /// Fail the next `open` with `error`
    pub(crate) fn fail_next(&self, error: FeedError) {
        self.failures.lock().unwrap().push_back(error);
    }

    /// Fail every `open` from now on
    pub(crate) fn fail_always(&self) {
        self.always_fail.store(true, Ordering::SeqCst);
    }

    /// Make every later `open` take `delay` before answering
    pub(crate) fn slow_open(&self, delay: Duration) {
        *self.open_delay.lock().unwrap() = delay;
    }

    pub(crate) fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub(crate) fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn open(&self, _credentials: &Credentials) -> Result<ConnectionHandle, FeedError> {
        let delay = *self.open_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.always_fail.load(Ordering::SeqCst) {
            return Err(FeedError::Network("connection refused".into()));
        }
        if let Some(error) = self.failures.lock().unwrap().pop_front() {
            return Err(error);
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(ConnectionHandle::new("mock://rest", "mock://ws", true))
    }

    async fn release(&self, _handle: &ConnectionHandle) -> Result<(), FeedError> {
        self.released.fetch_add(1, Ordering::SeqCst);
        if self.release_error {
            return Err(FeedError::Transport("close frame rejected".into()));
        }
        Ok(())
    }
}

/// What a scripted subscription does when read
#[derive(Debug, Clone)]
pub(crate) enum Step {
    /// Deliver a price for the subscribed symbol
    Price(Decimal),
    /// Deliver a price tagged with a different symbol
    PriceFor(&'static str, Decimal),
    /// Never deliver anything
    Silent,
    /// End of stream without payload
    Closed,
    /// Read fails
    RecvError,
    /// Opening the subscription fails
    SubscribeError,
}

/// Ticker source replaying per-symbol scripts
///
/// Symbols without a remaining script step behave as `Step::Closed`.
pub(crate) struct ScriptedSource {
    scripts: Mutex<HashMap<Symbol, VecDeque<Step>>>,
    visits: Mutex<Vec<(Symbol, uuid::Uuid)>>,
    latency: Duration,
    opened: AtomicUsize,
    closed: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub(crate) fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            visits: Mutex::new(Vec::new()),
            latency: Duration::ZERO,
            opened: AtomicUsize::new(0),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Delay every delivered price by `latency`
    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub(crate) fn script(&self, symbol: &str, steps: impl IntoIterator<Item = Step>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(Symbol::new(symbol))
            .or_default()
            .extend(steps);
    }

    /// Symbols and handle ids in subscription order
    pub(crate) fn visits(&self) -> Vec<(Symbol, uuid::Uuid)> {
        self.visits.lock().unwrap().clone()
    }

    pub(crate) fn visited_symbols(&self) -> Vec<String> {
        self.visits()
            .into_iter()
            .map(|(symbol, _)| symbol.to_string())
            .collect()
    }

    pub(crate) fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub(crate) fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TickerSource for ScriptedSource {
    async fn subscribe(
        &self,
        handle: &ConnectionHandle,
        symbol: &Symbol,
    ) -> Result<Box<dyn Subscription>, FeedError> {
        self.visits
            .lock()
            .unwrap()
            .push((symbol.clone(), handle.id()));

        let step = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(symbol)
            .and_then(|steps| steps.pop_front())
            .unwrap_or(Step::Closed);

        if let Step::SubscribeError = step {
            return Err(FeedError::Subscribe("stream rejected".into()));
        }

        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSubscription {
            symbol: symbol.clone(),
            step,
            latency: self.latency,
            closed: self.closed.clone(),
        }))
    }
}

struct ScriptedSubscription {
    symbol: Symbol,
    step: Step,
    latency: Duration,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl Subscription for ScriptedSubscription {
    async fn recv(&mut self) -> Result<Option<TickerMessage>, FeedError> {
        match self.step.clone() {
            Step::Price(price) => {
                tokio::time::sleep(self.latency).await;
                Ok(Some(TickerMessage {
                    symbol: self.symbol.clone(),
                    price,
                    event_time: Utc::now(),
                }))
            }
            Step::PriceFor(symbol, price) => Ok(Some(TickerMessage {
                symbol: Symbol::new(symbol),
                price,
                event_time: Utc::now(),
            })),
            Step::Silent => std::future::pending().await,
            Step::Closed => Ok(None),
            Step::RecvError => Err(FeedError::Transport("connection reset".into())),
            Step::SubscribeError => unreachable!("subscribe errors never open a subscription"),
        }
    }

    async fn close(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}
