//! Binance REST client for connectivity checks and account balances
//!
//! Only the two endpoints the feed needs: `/api/v3/ping` to prove the
//! exchange is reachable and the signed `/api/v3/account` to validate
//! credentials and read balances.

use crate::feed::{Credentials, FeedError};
use chrono::Utc;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

/// Binance error codes that mean the key or signature was rejected
const AUTH_ERROR_CODES: [i64; 3] = [-2014, -2015, -1022];

/// Configuration for the REST client
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Base URL, e.g. `https://api.binance.us`
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// `recvWindow` sent with signed requests (milliseconds)
    pub recv_window_ms: u64,
}

impl RestConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(10),
            recv_window_ms: 5000,
        }
    }
}

/// Account response, trimmed to balances
#[derive(Debug, Clone, Deserialize)]
pub struct AccountInfo {
    pub balances: Vec<AssetBalance>,
}

/// One asset balance line
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AssetBalance {
    pub asset: String,
    pub free: Decimal,
    pub locked: Decimal,
}

/// Binance error body
#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
    msg: String,
}

/// Client for the Binance spot REST API
#[derive(Debug, Clone)]
pub struct BinanceRestClient {
    config: RestConfig,
    client: Client,
}

impl BinanceRestClient {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        Self::with_config(RestConfig::new(base_url))
    }

    pub fn with_config(config: RestConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Check that the exchange answers at all
    pub async fn ping(&self) -> Result<(), FeedError> {
        let url = format!("{}/api/v3/ping", self.config.base_url);
        tracing::debug!(url = %url, "Pinging exchange");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FeedError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(FeedError::Network(format!("ping returned HTTP {}", status)))
        }
    }

    /// Fetch account balances with a signed request
    pub async fn account(&self, credentials: &Credentials) -> Result<AccountInfo, FeedError> {
        let query = format!(
            "recvWindow={}&timestamp={}",
            self.config.recv_window_ms,
            Utc::now().timestamp_millis()
        );
        let signature = sign(&query, &credentials.secret_key);
        let url = format!(
            "{}/api/v3/account?{}&signature={}",
            self.config.base_url, query, signature
        );

        let response = self
            .client
            .get(&url)
            .header("X-MBX-APIKEY", &credentials.api_key)
            .send()
            .await
            .map_err(|e| FeedError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<AccountInfo>()
                .await
                .map_err(|e| FeedError::Decode(e.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_error(status, &body))
    }
}

/// Hex-encoded HMAC-SHA256 of `query` keyed by the API secret
pub fn sign(query: &str, secret: &str) -> String {
    let mac = hmac_sha256::HMAC::mac(query.as_bytes(), secret.as_bytes());
    hex::encode(mac)
}

/// Map a failed response onto the feed's error taxonomy
fn classify_error(status: StatusCode, body: &str) -> FeedError {
    let api_error = serde_json::from_str::<ApiError>(body).ok();
    let rejected_key = api_error
        .as_ref()
        .is_some_and(|e| AUTH_ERROR_CODES.contains(&e.code));

    let message = match &api_error {
        Some(e) => format!("{} ({})", e.msg, e.code),
        None => format!("HTTP {}", status),
    };

    if rejected_key || status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        FeedError::Auth(message)
    } else {
        FeedError::Network(message)
    }
}
