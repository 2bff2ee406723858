//! End-to-end integration tests

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use ticker_feed::config::{BalanceMode, Config};
use ticker_feed::feed::{PriceStore, Symbol, SupervisorConfig};
use ticker_feed::portfolio::{derive_symbols, BalanceSource, PortfolioSummary, StaticBalances};

#[test]
fn test_config_example_loads() {
    let config = Config::load(concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml.example")).unwrap();

    assert_eq!(config.exchange.region, "us");
    assert_eq!(config.feed.quote_asset, "USDT");
    assert_eq!(config.portfolio.balances, BalanceMode::Account);
    assert_eq!(config.portfolio.highlight_symbol, Some(Symbol::new("BNBUSDT")));

    let supervisor = SupervisorConfig::from(&config.feed);
    assert_eq!(supervisor.socket_timeout.as_secs(), 15);
    assert_eq!(supervisor.retry.max_attempts, 10);
}

#[tokio::test]
async fn test_static_portfolio_valued_from_store() {
    let config: Config = toml::from_str(
        r#"
        [portfolio]
        balances = "static"

        [[portfolio.holdings]]
        asset = "USDT"
        free = 100

        [[portfolio.holdings]]
        asset = "BTC"
        free = "0.01"
    "#,
    )
    .unwrap();

    let holdings = StaticBalances::new(config.portfolio.holdings.clone())
        .balances()
        .await
        .unwrap();
    assert_eq!(
        derive_symbols(&holdings, &config.feed.quote_asset),
        vec![Symbol::new("BTCUSDT")]
    );

    let store = PriceStore::new();
    let highlight = config.portfolio.highlight_symbol.clone();

    let before = PortfolioSummary::compute(
        &holdings,
        &store.prices().await,
        "USDT",
        "BTC",
        highlight.as_ref(),
    );
    assert_eq!(before.total_quote, Decimal::ZERO);
    assert!(!before.is_complete());

    store
        .set(Symbol::new("BTCUSDT"), dec!(50000), chrono::Utc::now())
        .await;
    let after = PortfolioSummary::compute(
        &holdings,
        &store.prices().await,
        "USDT",
        "BTC",
        highlight.as_ref(),
    );
    assert_eq!(after.total_quote, dec!(600));
    assert_eq!(after.total_reference, dec!(0.012));
    assert_eq!(
        after.distribution,
        vec![("USDT".to_string(), dec!(100)), ("BTC".to_string(), dec!(500))]
    );
}
