//! CLI interface for ticker-feed
//!
//! Provides subcommands for:
//! - `run`: Stream prices and show live portfolio value
//! - `balances`: Print the holdings the feed would track
//! - `config`: Show the effective configuration

mod balances;
mod run;

pub use balances::BalancesArgs;
pub use run::RunArgs;

use crate::config::{BalanceMode, Config};
use crate::exchange::BinanceRestClient;
use crate::portfolio::{BalanceSource, BinanceAccountClient, StaticBalances};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "ticker-feed")]
#[command(about = "Live Binance ticker feed with portfolio valuation")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stream prices and show live portfolio value
    Run(RunArgs),
    /// Print tracked holdings
    Balances(BalancesArgs),
    /// Show effective configuration
    Config,
}

/// Balance source selected by `portfolio.balances`
pub fn balance_source(config: &Config) -> anyhow::Result<Box<dyn BalanceSource>> {
    match config.portfolio.balances {
        BalanceMode::Static => Ok(Box::new(StaticBalances::new(
            config.portfolio.holdings.clone(),
        ))),
        BalanceMode::Account => {
            let rest = BinanceRestClient::new(config.exchange.endpoints().rest_url)?;
            Ok(Box::new(BinanceAccountClient::new(
                rest,
                config.exchange.credentials(),
                config.portfolio.tracked_assets.clone(),
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::Holding;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_run_command() {
        let cli = Cli::try_parse_from(["ticker-feed", "-c", "feed.toml", "run", "--json"]).unwrap();
        assert_eq!(cli.config, "feed.toml");
        assert!(matches!(cli.command, Commands::Run(RunArgs { json: true })));
    }

    #[test]
    fn test_default_config_path() {
        let cli = Cli::try_parse_from(["ticker-feed", "config"]).unwrap();
        assert_eq!(cli.config, "config.toml");
        assert!(matches!(cli.command, Commands::Config));
    }

    #[tokio::test]
    async fn test_static_balance_source() {
        let mut config = Config::default();
        config.portfolio.balances = BalanceMode::Static;
        config.portfolio.holdings = vec![Holding::new("BTC", dec!(1))];

        let holdings = balance_source(&config).unwrap().balances().await.unwrap();
        assert_eq!(holdings, vec![Holding::new("BTC", dec!(1))]);
    }
}
