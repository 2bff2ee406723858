//! Balances command implementation

use crate::config::Config;
use crate::portfolio::derive_symbols;
use clap::Args;

#[derive(Args, Debug)]
pub struct BalancesArgs {
    /// Also list the symbols the feed would subscribe to
    #[arg(short, long)]
    pub symbols: bool,
}

impl BalancesArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let holdings = super::balance_source(config)?.balances().await?;

        println!("Holdings ({:?}):", config.portfolio.balances);
        for holding in &holdings {
            println!("  {:<8} {}", holding.asset, holding.free);
        }

        if self.symbols {
            let symbols = derive_symbols(&holdings, &config.feed.quote_asset);
            println!("Symbols:");
            for symbol in symbols {
                println!("  {}", symbol);
            }
        }

        Ok(())
    }
}
