//! Run command implementation

use crate::config::Config;
use crate::exchange::BinanceConnector;
use crate::feed::{BinanceTickerSource, FeedController, SupervisorConfig, Symbol};
use crate::portfolio::{derive_symbols, Holding, PortfolioSummary};
use crate::telemetry::{set_gauge, GaugeMetric};
use anyhow::Context;
use clap::Args;
use rust_decimal::prelude::ToPrimitive;
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Print each summary as a JSON line instead of a table
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let holdings = super::balance_source(config)?
            .balances()
            .await
            .context("Failed to load balances")?;

        let quote = config.feed.quote_asset.as_str();
        let reference = config.portfolio.reference_asset.as_str();
        let highlight = config.portfolio.highlight_symbol.as_ref();
        let symbols = feed_symbols(&holdings, quote, reference, highlight);

        let connector = BinanceConnector::new(&config.exchange.endpoints())?;
        let controller = FeedController::new(
            Arc::new(connector),
            Arc::new(BinanceTickerSource::new()),
            SupervisorConfig::from(&config.feed),
        );

        controller
            .start(config.exchange.credentials(), symbols)
            .await
            .context("Failed to start price feed")?;

        let store = controller.store();
        let mut ticker =
            tokio::time::interval(Duration::from_millis(config.portfolio.render_interval_ms));
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Received Ctrl+C, shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    if !controller.is_running().await {
                        tracing::error!("Price feed stopped unexpectedly");
                        break;
                    }

                    let prices = store.prices().await;
                    let summary =
                        PortfolioSummary::compute(&holdings, &prices, quote, reference, highlight);
                    self.render(&summary)?;
                }
            }
        }

        let stats = controller.stats().await;
        let result = controller.stop().await;
        tracing::info!(
            passes = stats.passes_completed,
            observed = stats.observed,
            reconnects = stats.reconnects,
            "Price feed finished"
        );
        result.context("Price feed ended with an error")
    }

    fn render(&self, summary: &PortfolioSummary) -> anyhow::Result<()> {
        set_gauge(
            GaugeMetric::PortfolioValueQuote,
            summary.total_quote.to_f64().unwrap_or_default(),
        );
        set_gauge(
            GaugeMetric::PortfolioValueReference,
            summary.total_reference.to_f64().unwrap_or_default(),
        );

        if self.json {
            println!("{}", serde_json::to_string(summary)?);
            return Ok(());
        }

        if !summary.is_complete() {
            println!("Waiting for prices...");
            return Ok(());
        }

        println!(
            "Total: {} {} | {} {}",
            summary.total_quote.round_dp(2),
            summary.quote_asset,
            summary.total_reference.round_dp(8),
            summary.reference_asset
        );
        if let Some((symbol, price)) = &summary.highlight {
            println!("  {}: {}", symbol, price);
        }
        for (asset, value) in &summary.distribution {
            println!("  {:<8} {} {}", asset, value.round_dp(2), summary.quote_asset);
        }
        Ok(())
    }
}

/// Held pairs plus the pairs valuation needs, each once
fn feed_symbols(
    holdings: &[Holding],
    quote: &str,
    reference: &str,
    highlight: Option<&Symbol>,
) -> Vec<Symbol> {
    let mut symbols = derive_symbols(holdings, quote);
    let mut extra = Vec::new();
    if !reference.eq_ignore_ascii_case(quote) {
        extra.push(Symbol::pair(reference, quote));
    }
    extra.extend(highlight.cloned());

    for symbol in extra {
        if !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    }
    symbols
}
