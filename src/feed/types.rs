//! Price feed types

use super::FeedError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trading pair identifier (e.g., "BTCUSDT")
///
/// Always stored upper case so that `btcusdt` and `BTCUSDT` name the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Create a symbol from a pair name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into().to_uppercase())
    }

    /// Build the symbol for `base` quoted in `quote`
    pub fn pair(base: &str, quote: &str) -> Self {
        Self::new(format!("{base}{quote}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lower-case name used in exchange stream paths
    pub fn stream_name(&self) -> String {
        self.0.to_lowercase()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Symbol {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

/// Latest observed price for a symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceEntry {
    /// Trading symbol
    pub symbol: Symbol,
    /// Last traded price
    pub price: Decimal,
    /// Local time at which the price was received
    pub updated_at: DateTime<Utc>,
}

/// A single decoded ticker message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerMessage {
    /// Symbol the exchange reported
    pub symbol: Symbol,
    /// Last price
    pub price: Decimal,
    /// Exchange event time
    pub event_time: DateTime<Utc>,
}

/// Outcome of one receive-with-timeout round for one symbol
#[derive(Debug, Clone)]
pub enum RoundResult {
    /// A price arrived before the deadline
    Observed {
        price: Decimal,
        timestamp: DateTime<Utc>,
    },
    /// Nothing arrived before the deadline
    TimedOut,
    /// The read completed without a payload
    Empty,
    /// The subscription or the read raised a transport fault
    Failed(FeedError),
}

impl RoundResult {
    /// Short outcome label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            RoundResult::Observed { .. } => "observed",
            RoundResult::TimedOut => "timed_out",
            RoundResult::Empty => "empty",
            RoundResult::Failed(_) => "failed",
        }
    }
}

/// Exchange API credentials
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub secret_key: String,
    /// Exchange region ("us" selects binance.us)
    pub region: String,
}

impl Credentials {
    pub fn new(
        api_key: impl Into<String>,
        secret_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            secret_key: secret_key.into(),
            region: region.into(),
        }
    }

    /// Whether both key halves are present
    pub fn has_keys(&self) -> bool {
        !self.api_key.is_empty() && !self.secret_key.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &redact(&self.api_key))
            .field("secret_key", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}

fn redact(key: &str) -> String {
    match key.get(..4) {
        Some(prefix) if key.len() > 8 => format!("{prefix}..."),
        _ => "<redacted>".to_string(),
    }
}
