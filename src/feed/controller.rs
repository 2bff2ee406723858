//! Starts and stops the background price feed

use super::{
    ConnectionManager, Connector, Credentials, FeedError, FeedStats, PriceStore,
    StreamSession, SubscriptionSupervisor, SupervisorConfig, Symbol, TickerSource,
};
use std::sync::Arc;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;

struct RunningFeed {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<Result<(), FeedError>>,
}

/// Owns the price store and the supervisor task
///
/// The store outlives individual start/stop cycles, so readers holding a
/// clone keep seeing the last known prices after a stop.
pub struct FeedController {
    manager: Arc<ConnectionManager>,
    source: Arc<dyn TickerSource>,
    config: SupervisorConfig,
    store: PriceStore,
    stats: Arc<RwLock<FeedStats>>,
    running: Mutex<Option<RunningFeed>>,
}

impl FeedController {
    pub fn new(
        connector: Arc<dyn Connector>,
        source: Arc<dyn TickerSource>,
        config: SupervisorConfig,
    ) -> Self {
        Self {
            manager: Arc::new(ConnectionManager::new(connector)),
            source,
            config,
            store: PriceStore::new(),
            stats: Arc::new(RwLock::new(FeedStats::default())),
            running: Mutex::new(None),
        }
    }

    /// Shared handle onto the latest prices
    pub fn store(&self) -> PriceStore {
        self.store.clone()
    }

    /// Connect and launch the supervisor in the background
    ///
    /// Connection errors surface here; once this returns `Ok` all further
    /// faults are handled inside the supervisor.
    pub async fn start(&self, credentials: Credentials, symbols: Vec<Symbol>) -> Result<(), FeedError> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return Err(FeedError::AlreadyRunning);
        }
        if symbols.is_empty() {
            return Err(FeedError::NoSymbols);
        }

        let handle = self.manager.connect(&credentials).await?;

        tracing::info!(
            symbols = %symbols.iter().map(Symbol::as_str).collect::<Vec<_>>().join(","),
            "Starting price feed"
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let supervisor = SubscriptionSupervisor::new(
            self.config.clone(),
            self.manager.clone(),
            StreamSession::new(self.source.clone()),
            self.store.clone(),
            credentials,
            handle,
            symbols,
        )
        .with_stats(self.stats.clone());

        let task = tokio::spawn(supervisor.run(shutdown_rx));
        *running = Some(RunningFeed { shutdown_tx, task });
        Ok(())
    }

    /// Signal the supervisor and wait for it to finish its current round
    ///
    /// Returns the supervisor's own error if it had already given up.
    /// Stopping a feed that is not running is a no-op.
    pub async fn stop(&self) -> Result<(), FeedError> {
        let Some(feed) = self.running.lock().await.take() else {
            return Ok(());
        };

        tracing::info!("Stopping price feed");
        // The supervisor may already have exited and dropped its receiver
        let _ = feed.shutdown_tx.send(true);

        match feed.task.await {
            Ok(result) => result,
            Err(e) => Err(FeedError::Task(e.to_string())),
        }
    }

    /// Whether the supervisor task is alive
    pub async fn is_running(&self) -> bool {
        self.running
            .lock()
            .await
            .as_ref()
            .is_some_and(|feed| !feed.task.is_finished())
    }

    /// Counters accumulated across all runs
    pub async fn stats(&self) -> FeedStats {
        self.stats.read().await.clone()
    }
}
