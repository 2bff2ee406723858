//! Price feed errors

use thiserror::Error;
use uuid::Uuid;

/// Price feed errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeedError {
    /// Exchange rejected the credentials
    #[error("Authentication failed: {0}")]
    Auth(String),
    /// Exchange endpoint unreachable
    #[error("Network error: {0}")]
    Network(String),
    /// Feed started twice without a stop
    #[error("Feed is already running")]
    AlreadyRunning,
    /// Feed started with an empty symbol set
    #[error("No symbols to track")]
    NoSymbols,
    /// Connection could not be re-established
    #[error("Reconnection failed after {attempts} attempts")]
    ReconnectExhausted { attempts: u32 },
    /// Opening a ticker subscription failed
    #[error("Subscription failed: {0}")]
    Subscribe(String),
    /// Reading from an open subscription failed
    #[error("Transport error: {0}")]
    Transport(String),
    /// Payload could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),
    /// Handle was used after close
    #[error("Connection {0} is closed")]
    HandleClosed(Uuid),
    /// Supervisor task panicked or was aborted
    #[error("Supervisor task failed: {0}")]
    Task(String),
}

impl FeedError {
    /// Whether the error is worth retrying with a fresh connection
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FeedError::Auth(_))
    }
}
