//! Round-robin subscription supervisor
//!
//! Visits every symbol once per pass, in a fixed order, one round at a time.
//! Observed prices go to the store; a timed-out round recreates the shared
//! connection so the next symbol already runs on the fresh handle.

use super::{
    ConnectionHandle, ConnectionManager, Credentials, FeedError, PriceStore, RetryPolicy,
    RoundResult, StreamSession, Symbol,
};
use crate::config::FeedConfig;
use crate::telemetry::{
    record_connection, record_latency, record_round, set_gauge, ConnectionEvent, GaugeMetric,
    LatencyMetric,
};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, RwLock};

/// Timing and recovery policy for the supervisor loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// Deadline for a single round
    pub socket_timeout: Duration,
    /// Pause between passes
    pub pass_interval: Duration,
    /// Treat `Failed` rounds like timeouts and recreate the connection
    pub reconnect_on_failure: bool,
    /// Backoff applied when recreating the connection fails
    pub retry: RetryPolicy,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            socket_timeout: Duration::from_secs(15),
            pass_interval: Duration::from_secs(1),
            reconnect_on_failure: true,
            retry: RetryPolicy::default(),
        }
    }
}

impl SupervisorConfig {
    pub fn socket_timeout(mut self, d: Duration) -> Self {
        self.socket_timeout = d;
        self
    }

    pub fn pass_interval(mut self, d: Duration) -> Self {
        self.pass_interval = d;
        self
    }

    pub fn reconnect_on_failure(mut self, enabled: bool) -> Self {
        self.reconnect_on_failure = enabled;
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl From<&FeedConfig> for SupervisorConfig {
    fn from(config: &FeedConfig) -> Self {
        Self {
            socket_timeout: Duration::from_secs(config.socket_timeout_secs),
            pass_interval: Duration::from_millis(config.pass_interval_ms),
            reconnect_on_failure: config.reconnect_on_failure,
            retry: RetryPolicy::from(&config.retry),
        }
    }
}

/// Counters accumulated across passes
#[derive(Debug, Default, Clone)]
pub struct FeedStats {
    pub passes_completed: u64,
    pub observed: u64,
    pub timed_out: u64,
    pub empty: u64,
    pub failed: u64,
    pub reconnects: u64,
    pub reconnect_failures: u64,
    pub last_pass_at: Option<DateTime<Utc>>,
    pub last_pass_duration: Option<Duration>,
}

/// Summary of a single pass
#[derive(Debug, Clone, Default)]
pub struct PassReport {
    /// Symbols visited, in order
    pub visited: Vec<Symbol>,
    /// Whether every symbol was visited before a stop request
    pub completed: bool,
    pub reconnects: u32,
    pub elapsed: Duration,
}

/// Drives one round per symbol per pass and applies the recovery policy
pub struct SubscriptionSupervisor {
    config: SupervisorConfig,
    manager: Arc<ConnectionManager>,
    session: StreamSession,
    store: PriceStore,
    credentials: Credentials,
    handle: ConnectionHandle,
    symbols: Arc<[Symbol]>,
    stats: Arc<RwLock<FeedStats>>,
}

impl SubscriptionSupervisor {
    /// Create a supervisor that starts on an already-connected `handle`
    pub fn new(
        config: SupervisorConfig,
        manager: Arc<ConnectionManager>,
        session: StreamSession,
        store: PriceStore,
        credentials: Credentials,
        handle: ConnectionHandle,
        symbols: Vec<Symbol>,
    ) -> Self {
        Self {
            config,
            manager,
            session,
            store,
            credentials,
            handle,
            symbols: symbols.into(),
            stats: Arc::new(RwLock::new(FeedStats::default())),
        }
    }

    /// Share stats with an outside owner
    pub fn with_stats(mut self, stats: Arc<RwLock<FeedStats>>) -> Self {
        self.stats = stats;
        self
    }

    pub fn stats(&self) -> Arc<RwLock<FeedStats>> {
        self.stats.clone()
    }

    /// Handle the next round will use
    pub fn current_handle(&self) -> &ConnectionHandle {
        &self.handle
    }

    /// Run passes until `shutdown` turns true or its sender is dropped
    ///
    /// The connection is closed on every exit path. Only a reconnection that
    /// cannot succeed ends the loop with an error.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), FeedError> {
        tracing::info!(
            symbols = self.symbols.len(),
            timeout_secs = self.config.socket_timeout.as_secs_f64(),
            "Subscription supervisor started"
        );
        set_gauge(GaugeMetric::TrackedSymbols, self.symbols.len() as f64);

        let result = self.run_loop(&mut shutdown).await;
        self.manager.close(&self.handle).await;

        match &result {
            Ok(()) => tracing::info!("Subscription supervisor stopped"),
            Err(e) => tracing::error!(error = %e, "Subscription supervisor gave up"),
        }
        result
    }

    async fn run_loop(&mut self, shutdown: &mut watch::Receiver<bool>) -> Result<(), FeedError> {
        loop {
            let report = self.run_pass(shutdown).await?;
            if !report.completed {
                return Ok(());
            }
            if wait_or_stop(self.config.pass_interval, shutdown).await {
                return Ok(());
            }
        }
    }

    /// Visit every symbol once, in order
    ///
    /// A stop request is honoured between rounds, never during one.
    pub async fn run_pass(
        &mut self,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<PassReport, FeedError> {
        let started = Instant::now();
        let symbols = Arc::clone(&self.symbols);
        let mut report = PassReport::default();

        for symbol in symbols.iter() {
            if stop_requested(shutdown) {
                report.elapsed = started.elapsed();
                return Ok(report);
            }

            let result = self
                .session
                .run_round(&self.handle, symbol, self.config.socket_timeout)
                .await;
            record_round(symbol, result.label());
            report.visited.push(symbol.clone());

            if self.handle_result(symbol, result, shutdown).await? {
                report.reconnects += 1;
            }
        }

        report.completed = true;
        report.elapsed = started.elapsed();
        record_latency(LatencyMetric::Pass, report.elapsed);

        let mut stats = self.stats.write().await;
        stats.passes_completed += 1;
        stats.last_pass_at = Some(Utc::now());
        stats.last_pass_duration = Some(report.elapsed);
        drop(stats);

        tracing::debug!(
            symbols = report.visited.len(),
            reconnects = report.reconnects,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Pass complete"
        );
        Ok(report)
    }

    /// Apply the policy for one round; returns whether the connection was recreated
    async fn handle_result(
        &mut self,
        symbol: &Symbol,
        result: RoundResult,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<bool, FeedError> {
        match result {
            RoundResult::Observed { price, timestamp } => {
                self.store.set(symbol.clone(), price, timestamp).await;
                self.stats.write().await.observed += 1;
                tracing::trace!(%symbol, %price, "Price updated");
                Ok(false)
            }
            RoundResult::TimedOut => {
                self.stats.write().await.timed_out += 1;
                tracing::warn!(
                    %symbol,
                    handle = %self.handle.id(),
                    "No ticker within timeout, reconnecting"
                );
                self.reconnect(shutdown).await
            }
            RoundResult::Empty => {
                self.stats.write().await.empty += 1;
                tracing::info!(%symbol, "No data received");
                Ok(false)
            }
            RoundResult::Failed(e) => {
                self.stats.write().await.failed += 1;
                tracing::warn!(%symbol, error = %e, "Ticker round failed");
                if self.config.reconnect_on_failure {
                    self.reconnect(shutdown).await
                } else {
                    Ok(false)
                }
            }
        }
    }

    /// Replace the shared handle, backing off between failed attempts
    ///
    /// Returns `Ok(false)` when a stop request interrupts a connection
    /// attempt or the backoff. The caller exits at the next round boundary
    /// and `run` closes whatever handle is left.
    async fn reconnect(&mut self, shutdown: &mut watch::Receiver<bool>) -> Result<bool, FeedError> {
        let mut attempts = 0u32;
        let Some(mut outcome) = until_stopped(
            self.manager.recreate(&self.handle, &self.credentials),
            shutdown,
        )
        .await
        else {
            tracing::info!("Stop requested during reconnection");
            return Ok(false);
        };

        loop {
            match outcome {
                Ok(handle) => {
                    tracing::info!(
                        old = %self.handle.id(),
                        new = %handle.id(),
                        attempts = attempts + 1,
                        "Connection recreated"
                    );
                    self.handle = handle;
                    self.stats.write().await.reconnects += 1;
                    return Ok(true);
                }
                Err(e) => {
                    attempts += 1;
                    self.stats.write().await.reconnect_failures += 1;
                    record_connection(ConnectionEvent::ReconnectFailed);

                    if !e.is_retryable() {
                        tracing::error!(error = %e, "Reconnection rejected");
                        return Err(e);
                    }
                    if self.config.retry.is_exhausted(attempts) {
                        tracing::error!(error = %e, attempts, "Giving up on reconnection");
                        return Err(FeedError::ReconnectExhausted { attempts });
                    }

                    let delay = self.config.retry.delay_for(attempts);
                    tracing::warn!(
                        error = %e,
                        attempt = attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Reconnection failed, backing off"
                    );
                    if wait_or_stop(delay, shutdown).await {
                        return Ok(false);
                    }
                    outcome = match until_stopped(self.manager.connect(&self.credentials), shutdown).await {
                        Some(outcome) => outcome,
                        None => {
                            tracing::info!("Stop requested during reconnection");
                            return Ok(false);
                        }
                    };
                }
            }
        }
    }
}

/// Stop was requested, or the controller went away
fn stop_requested(shutdown: &watch::Receiver<bool>) -> bool {
    *shutdown.borrow() || shutdown.has_changed().is_err()
}

/// Drive `fut` to completion unless a stop arrives first; `None` on stop
async fn until_stopped<F: Future>(fut: F, shutdown: &mut watch::Receiver<bool>) -> Option<F::Output> {
    if stop_requested(shutdown) {
        return None;
    }

    tokio::pin!(fut);
    loop {
        let changed = tokio::select! {
            output = &mut fut => return Some(output),
            changed = shutdown.changed() => changed,
        };
        if changed.is_err() || *shutdown.borrow() {
            return None;
        }
    }
}

/// Sleep for `delay` unless a stop arrives first; returns true on stop
async fn wait_or_stop(delay: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    if stop_requested(shutdown) {
        return true;
    }

    loop {
        let changed = tokio::select! {
            _ = tokio::time::sleep(delay) => return false,
            changed = shutdown.changed() => changed,
        };
        if changed.is_err() || *shutdown.borrow() {
            return true;
        }
    }
}
