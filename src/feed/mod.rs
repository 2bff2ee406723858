//! Price feed module
//!
//! Keeps the latest Binance ticker price for a fixed set of symbols:
//! - `PriceStore`: concurrently readable latest-price map
//! - `ConnectionManager`: owns the shared exchange connection
//! - `StreamSession`: one bounded receive per symbol
//! - `SubscriptionSupervisor`: round-robin loop with reconnect policy
//! - `FeedController`: background start/stop

mod binance;
mod connection;
mod controller;
mod error;
mod retry;
mod session;
mod store;
mod supervisor;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use binance::BinanceTickerSource;
pub use connection::{ConnectionHandle, ConnectionManager};
pub use controller::FeedController;
pub use error::FeedError;
pub use retry::RetryPolicy;
pub use session::StreamSession;
pub use store::PriceStore;
pub use supervisor::{FeedStats, PassReport, SubscriptionSupervisor, SupervisorConfig};
pub use types::{Credentials, PriceEntry, RoundResult, Symbol, TickerMessage};

use async_trait::async_trait;

/// Opens and releases authenticated exchange sessions
#[async_trait]
pub trait Connector: Send + Sync {
    /// Establish a session; `Auth` on rejected credentials, `Network` when unreachable
    async fn open(&self, credentials: &Credentials) -> Result<ConnectionHandle, FeedError>;
    /// Release server-side resources held by `handle`
    async fn release(&self, handle: &ConnectionHandle) -> Result<(), FeedError>;
}

/// Opens per-symbol ticker subscriptions on a live handle
#[async_trait]
pub trait TickerSource: Send + Sync {
    async fn subscribe(
        &self,
        handle: &ConnectionHandle,
        symbol: &Symbol,
    ) -> Result<Box<dyn Subscription>, FeedError>;
}

/// A single open ticker stream
#[async_trait]
pub trait Subscription: Send {
    /// Next ticker message; `Ok(None)` when the stream ended without one
    async fn recv(&mut self) -> Result<Option<TickerMessage>, FeedError>;
    /// Release the stream; must be safe to call more than once
    async fn close(&mut self);
}
