//! Single receive-with-timeout round for one symbol

use super::{ConnectionHandle, FeedError, RoundResult, Symbol, TickerSource};
use crate::telemetry::{record_latency, LatencyMetric};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};

/// Runs rounds against a ticker source
///
/// Each round opens its own subscription, waits for one message and closes
/// the subscription again before returning, whatever the outcome.
#[derive(Clone)]
pub struct StreamSession {
    source: Arc<dyn TickerSource>,
}

impl StreamSession {
    pub fn new(source: Arc<dyn TickerSource>) -> Self {
        Self { source }
    }

    /// Wait at most `timeout` for one price update for `symbol`
    ///
    /// The deadline covers both opening the subscription and the read.
    pub async fn run_round(
        &self,
        handle: &ConnectionHandle,
        symbol: &Symbol,
        timeout: Duration,
    ) -> RoundResult {
        if handle.is_closed() {
            return RoundResult::Failed(FeedError::HandleClosed(handle.id()));
        }

        let deadline = Instant::now() + timeout;

        let mut subscription = match timeout_at(deadline, self.source.subscribe(handle, symbol)).await {
            Ok(Ok(subscription)) => subscription,
            Ok(Err(e)) => return RoundResult::Failed(e),
            Err(_) => return RoundResult::TimedOut,
        };

        let received = timeout_at(deadline, subscription.recv()).await;
        subscription.close().await;

        match received {
            Err(_) => RoundResult::TimedOut,
            Ok(Ok(None)) => RoundResult::Empty,
            Ok(Err(e)) => RoundResult::Failed(e),
            Ok(Ok(Some(message))) if message.symbol != *symbol => RoundResult::Failed(
                FeedError::Decode(format!("expected {}, received {}", symbol, message.symbol)),
            ),
            Ok(Ok(Some(message))) => {
                let timestamp = Utc::now();
                if let Ok(lag) = (timestamp - message.event_time).to_std() {
                    record_latency(LatencyMetric::PriceFeed, lag);
                }
                RoundResult::Observed {
                    price: message.price,
                    timestamp,
                }
            }
        }
    }
}
