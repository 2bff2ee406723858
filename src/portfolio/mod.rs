//! Portfolio module
//!
//! Held balances, the symbols derived from them, and valuation against the
//! price store's snapshot.

mod account;
pub mod valuation;

pub use account::BinanceAccountClient;
pub use valuation::{distribution_in_quote, total_in_quote, total_in_reference, PortfolioSummary};

use crate::feed::Symbol;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Free balance of one asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "HoldingRecord")]
pub struct Holding {
    /// Asset ticker (e.g., "BTC")
    pub asset: String,
    /// Freely available amount
    pub free: Decimal,
}

impl Holding {
    pub fn new(asset: impl Into<String>, free: Decimal) -> Self {
        Self {
            asset: asset.into().to_uppercase(),
            free,
        }
    }
}

/// Holding as written in config, before the asset name is normalised
#[derive(Deserialize)]
struct HoldingRecord {
    asset: String,
    free: Decimal,
}

impl From<HoldingRecord> for Holding {
    fn from(record: HoldingRecord) -> Self {
        Holding::new(record.asset, record.free)
    }
}

/// Trait for balance lookups
#[async_trait]
pub trait BalanceSource: Send + Sync {
    /// Current holdings, in a stable order
    async fn balances(&self) -> anyhow::Result<Vec<Holding>>;
}

/// Holdings declared up front (config file or tests)
#[derive(Debug, Clone, Default)]
pub struct StaticBalances {
    holdings: Vec<Holding>,
}

impl StaticBalances {
    pub fn new(holdings: Vec<Holding>) -> Self {
        Self { holdings }
    }
}

#[async_trait]
impl BalanceSource for StaticBalances {
    async fn balances(&self) -> anyhow::Result<Vec<Holding>> {
        Ok(self.holdings.clone())
    }
}

/// Symbols to track: each held asset paired with `quote`, in holding order
///
/// The quote asset itself needs no price and is skipped; duplicates are
/// dropped so every symbol is visited once per pass.
pub fn derive_symbols(holdings: &[Holding], quote: &str) -> Vec<Symbol> {
    let mut symbols: Vec<Symbol> = Vec::with_capacity(holdings.len());
    for holding in holdings {
        if holding.asset.eq_ignore_ascii_case(quote) {
            continue;
        }
        let symbol = Symbol::pair(&holding.asset, quote);
        if !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    }
    symbols
}
