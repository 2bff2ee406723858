//! Prometheus metrics
//!
//! Thin wrappers over the `metrics` facade. Without an installed recorder
//! every call is a no-op, so the feed can record unconditionally.

use crate::feed::Symbol;
use std::time::Duration;

/// Latency metric types
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// Exchange event time to local receipt
    PriceFeed,
    /// One full pass over all symbols
    Pass,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Symbols visited per pass
    TrackedSymbols,
    /// Portfolio value in the quote currency
    PortfolioValueQuote,
    /// Portfolio value in the reference asset
    PortfolioValueReference,
}

/// Connection lifecycle events
#[derive(Debug, Clone, Copy)]
pub enum ConnectionEvent {
    Opened,
    OpenFailed,
    Closed,
    /// A backoff attempt during reconnection failed
    ReconnectFailed,
}

impl LatencyMetric {
    fn name(self) -> &'static str {
        match self {
            LatencyMetric::PriceFeed => "tickerfeed_price_feed_latency_ms",
            LatencyMetric::Pass => "tickerfeed_pass_duration_ms",
        }
    }
}

impl GaugeMetric {
    fn name(self) -> &'static str {
        match self {
            GaugeMetric::TrackedSymbols => "tickerfeed_tracked_symbols",
            GaugeMetric::PortfolioValueQuote => "tickerfeed_portfolio_value_quote",
            GaugeMetric::PortfolioValueReference => "tickerfeed_portfolio_value_reference",
        }
    }
}

impl ConnectionEvent {
    fn label(self) -> &'static str {
        match self {
            ConnectionEvent::Opened => "opened",
            ConnectionEvent::OpenFailed => "open_failed",
            ConnectionEvent::Closed => "closed",
            ConnectionEvent::ReconnectFailed => "reconnect_failed",
        }
    }
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    let value_ms = duration.as_secs_f64() * 1000.0;
    metrics::histogram!(metric.name()).record(value_ms);
    tracing::trace!(metric = metric.name(), value_ms, "Recording latency");
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    metrics::gauge!(metric.name()).set(value);
}

/// Count one round outcome for `symbol`
pub fn record_round(symbol: &Symbol, outcome: &'static str) {
    metrics::counter!(
        "tickerfeed_rounds_total",
        "symbol" => symbol.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Count one connection lifecycle event
pub fn record_connection(event: ConnectionEvent) {
    metrics::counter!("tickerfeed_connection_events_total", "event" => event.label()).increment(1);
}
