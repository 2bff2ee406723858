//! ticker-feed: Live Binance ticker feed with portfolio valuation
//!
//! This library provides the core components for:
//! - A shared exchange connection with reconnect and backoff
//! - Round-robin ticker subscriptions with per-round deadlines
//! - A concurrently readable latest-price store
//! - Portfolio valuation in quote and reference currencies
//! - Structured logging and Prometheus metrics

pub mod cli;
pub mod config;
pub mod exchange;
pub mod feed;
pub mod portfolio;
pub mod telemetry;
