use clap::Parser;
use ticker_feed::cli::{Cli, Commands};
use ticker_feed::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
            eprintln!("Using default configuration");
            Config::default()
        }
    }
    .with_env_overrides();
    config.validate()?;

    // Initialize telemetry
    let _telemetry = ticker_feed::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!(region = %config.exchange.region, "Starting ticker feed");
            args.execute(&config).await?;
        }
        Commands::Balances(args) => {
            args.execute(&config).await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!(
                "  Exchange: region={} rest={} ws={}",
                config.exchange.region,
                config.exchange.endpoints().rest_url,
                config.exchange.endpoints().ws_url
            );
            println!(
                "  Credentials: {}",
                if config.exchange.credentials().has_keys() {
                    "configured"
                } else {
                    "missing"
                }
            );
            println!(
                "  Feed: quote={} timeout={}s interval={}ms reconnect_on_failure={}",
                config.feed.quote_asset,
                config.feed.socket_timeout_secs,
                config.feed.pass_interval_ms,
                config.feed.reconnect_on_failure
            );
            println!(
                "  Retry: max_attempts={} initial={}ms max={}ms",
                config.feed.retry.max_attempts,
                config.feed.retry.initial_delay_ms,
                config.feed.retry.max_delay_ms
            );
            println!(
                "  Portfolio: balances={:?} reference={} highlight={}",
                config.portfolio.balances,
                config.portfolio.reference_asset,
                config
                    .portfolio
                    .highlight_symbol
                    .as_ref()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "-".to_string())
            );
        }
    }

    Ok(())
}
