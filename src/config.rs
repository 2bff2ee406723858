//! Configuration types for ticker-feed

use crate::exchange::Endpoints;
use crate::feed::{Credentials, RetryPolicy, Symbol};
use crate::portfolio::Holding;
use crate::telemetry::LogFormat;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable overriding `exchange.api_key`
pub const API_KEY_ENV: &str = "BINANCE_API_KEY";
/// Environment variable overriding `exchange.secret_key`
pub const SECRET_KEY_ENV: &str = "BINANCE_SECRET_KEY";

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub portfolio: PortfolioConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Exchange access configuration
#[derive(Clone, Deserialize, Serialize)]
pub struct ExchangeConfig {
    /// "us" for binance.us, anything else for binance.com
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default, skip_serializing)]
    pub secret_key: String,
    /// Override the region's REST base URL
    #[serde(default)]
    pub rest_url: Option<String>,
    /// Override the region's WebSocket base URL
    #[serde(default)]
    pub ws_url: Option<String>,
}

fn default_region() -> String {
    "us".to_string()
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            api_key: String::new(),
            secret_key: String::new(),
            rest_url: None,
            ws_url: None,
        }
    }
}

impl std::fmt::Debug for ExchangeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeConfig")
            .field("region", &self.region)
            .field("credentials", &self.credentials())
            .field("rest_url", &self.rest_url)
            .field("ws_url", &self.ws_url)
            .finish()
    }
}

impl ExchangeConfig {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.api_key, &self.secret_key, &self.region)
    }

    /// Region defaults with any explicit URL overrides applied
    pub fn endpoints(&self) -> Endpoints {
        let mut endpoints = Endpoints::for_region(&self.region);
        if let Some(url) = &self.rest_url {
            endpoints.rest_url = url.clone();
        }
        if let Some(url) = &self.ws_url {
            endpoints.ws_url = url.clone();
        }
        endpoints
    }

    /// Replace file credentials with non-empty overrides
    pub fn apply_credential_overrides(&mut self, api_key: Option<String>, secret_key: Option<String>) {
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            self.api_key = key;
        }
        if let Some(secret) = secret_key.filter(|s| !s.is_empty()) {
            self.secret_key = secret;
        }
    }
}

/// Streaming price feed configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedConfig {
    /// Quote currency every held asset is paired with
    #[serde(default = "default_quote_asset")]
    pub quote_asset: String,

    /// Deadline for one ticker round (seconds)
    #[serde(default = "default_socket_timeout_secs")]
    pub socket_timeout_secs: u64,

    /// Pause between passes over all symbols (milliseconds)
    #[serde(default = "default_pass_interval_ms")]
    pub pass_interval_ms: u64,

    /// Recreate the connection after a transport fault, not only after a timeout
    #[serde(default = "default_true")]
    pub reconnect_on_failure: bool,

    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_quote_asset() -> String {
    "USDT".to_string()
}
fn default_socket_timeout_secs() -> u64 {
    15
}
fn default_pass_interval_ms() -> u64 {
    1000
}
fn default_true() -> bool {
    true
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            quote_asset: default_quote_asset(),
            socket_timeout_secs: default_socket_timeout_secs(),
            pass_interval_ms: default_pass_interval_ms(),
            reconnect_on_failure: true,
            retry: RetryConfig::default(),
        }
    }
}

/// Reconnection backoff configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Attempts before the feed gives up (0 = retry forever)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    10
}
fn default_initial_delay_ms() -> u64 {
    5000 // 5 seconds
}
fn default_max_delay_ms() -> u64 {
    60_000 // 1 minute
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        RetryPolicy::default()
            .max_attempts(config.max_attempts)
            .initial_delay(Duration::from_millis(config.initial_delay_ms))
            .max_delay(Duration::from_millis(config.max_delay_ms))
    }
}

/// Where holdings come from
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BalanceMode {
    /// Signed account query against the exchange
    #[default]
    Account,
    /// `portfolio.holdings` from this file
    Static,
}

/// Portfolio valuation configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PortfolioConfig {
    #[serde(default)]
    pub balances: BalanceMode,

    /// Assets read from the account, in display order
    #[serde(default = "default_tracked_assets")]
    pub tracked_assets: Vec<String>,

    /// Holdings used when `balances = "static"`
    #[serde(default)]
    pub holdings: Vec<Holding>,

    /// Second valuation unit next to the quote currency
    #[serde(default = "default_reference_asset")]
    pub reference_asset: String,

    /// Pair whose spot price is shown on its own
    #[serde(default = "default_highlight_symbol")]
    pub highlight_symbol: Option<Symbol>,

    /// How often the summary is refreshed (milliseconds)
    #[serde(default = "default_render_interval_ms")]
    pub render_interval_ms: u64,
}

fn default_tracked_assets() -> Vec<String> {
    vec!["BTC".to_string(), "ETH".to_string(), "BNB".to_string()]
}
fn default_reference_asset() -> String {
    "BTC".to_string()
}
fn default_highlight_symbol() -> Option<Symbol> {
    Some(Symbol::new("BNBUSDT"))
}
fn default_render_interval_ms() -> u64 {
    1000
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            balances: BalanceMode::default(),
            tracked_assets: default_tracked_assets(),
            holdings: Vec::new(),
            reference_asset: default_reference_asset(),
            highlight_symbol: default_highlight_symbol(),
            render_interval_ms: default_render_interval_ms(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Serve Prometheus metrics on this port when set
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Reject settings that parse but cannot drive the feed
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.feed.quote_asset.trim().is_empty(),
            "feed.quote_asset must not be empty"
        );
        anyhow::ensure!(
            self.feed.socket_timeout_secs > 0,
            "feed.socket_timeout_secs must be greater than zero"
        );
        anyhow::ensure!(
            self.feed.retry.max_delay_ms >= self.feed.retry.initial_delay_ms,
            "feed.retry.max_delay_ms ({}) is below feed.retry.initial_delay_ms ({})",
            self.feed.retry.max_delay_ms,
            self.feed.retry.initial_delay_ms
        );
        anyhow::ensure!(
            self.portfolio.render_interval_ms > 0,
            "portfolio.render_interval_ms must be greater than zero"
        );
        Ok(())
    }

    /// Apply `BINANCE_API_KEY` / `BINANCE_SECRET_KEY` from the environment
    pub fn with_env_overrides(mut self) -> Self {
        self.exchange.apply_credential_overrides(
            std::env::var(API_KEY_ENV).ok(),
            std::env::var(SECRET_KEY_ENV).ok(),
        );
        self
    }
}
