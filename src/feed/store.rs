//! Latest-price store shared between the supervisor and readers

use super::{PriceEntry, Symbol};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Thread-safe map from symbol to its most recent price
///
/// Cloning is cheap and yields a handle onto the same map. Entries are
/// replaced whole under the write lock, so a reader sees either the previous
/// entry or the new one.
#[derive(Debug, Clone, Default)]
pub struct PriceStore {
    entries: Arc<RwLock<HashMap<Symbol, PriceEntry>>>,
}

impl PriceStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entry for `symbol`
    pub async fn set(&self, symbol: Symbol, price: Decimal, timestamp: DateTime<Utc>) {
        let entry = PriceEntry {
            symbol: symbol.clone(),
            price,
            updated_at: timestamp,
        };
        let mut entries = self.entries.write().await;
        entries.insert(symbol, entry);
    }

    /// Latest entry for `symbol`, if any round for it has succeeded yet
    pub async fn get(&self, symbol: &Symbol) -> Option<PriceEntry> {
        let entries = self.entries.read().await;
        entries.get(symbol).cloned()
    }

    /// Snapshot of every entry
    pub async fn get_all(&self) -> HashMap<Symbol, PriceEntry> {
        let entries = self.entries.read().await;
        entries.clone()
    }

    /// Snapshot of prices only
    pub async fn prices(&self) -> HashMap<Symbol, Decimal> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .map(|(symbol, entry)| (symbol.clone(), entry.price))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
