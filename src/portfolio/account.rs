//! Balances read from the Binance account endpoint

use super::{BalanceSource, Holding};
use crate::exchange::{AssetBalance, BinanceRestClient};
use crate::feed::Credentials;
use anyhow::Context;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Reads free balances for a fixed list of tracked assets
pub struct BinanceAccountClient {
    rest: BinanceRestClient,
    credentials: Credentials,
    tracked_assets: Vec<String>,
}

impl BinanceAccountClient {
    pub fn new(rest: BinanceRestClient, credentials: Credentials, tracked_assets: Vec<String>) -> Self {
        Self {
            rest,
            credentials,
            tracked_assets,
        }
    }

    /// Keep tracked assets only, in tracked order; missing ones count as zero
    fn select(&self, balances: &[AssetBalance]) -> Vec<Holding> {
        self.tracked_assets
            .iter()
            .map(|asset| {
                let free = balances
                    .iter()
                    .find(|b| b.asset.eq_ignore_ascii_case(asset))
                    .map(|b| b.free)
                    .unwrap_or(Decimal::ZERO);
                Holding::new(asset.as_str(), free)
            })
            .collect()
    }
}

#[async_trait]
impl BalanceSource for BinanceAccountClient {
    async fn balances(&self) -> anyhow::Result<Vec<Holding>> {
        if !self.credentials.has_keys() {
            anyhow::bail!("Account balances need an API key and secret");
        }

        let account = self
            .rest
            .account(&self.credentials)
            .await
            .context("Failed to fetch account balances")?;

        let holdings = self.select(&account.balances);
        tracing::info!(assets = holdings.len(), "Loaded account balances");
        Ok(holdings)
    }
}
