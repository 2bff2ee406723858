//! Binance exchange access
//!
//! REST connectivity/account checks and the `Connector` used by the feed.

mod connector;
mod rest;

pub use connector::BinanceConnector;
pub use rest::{sign, AccountInfo, AssetBalance, BinanceRestClient, RestConfig};

/// REST and WebSocket base URLs for one Binance deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub rest_url: String,
    pub ws_url: String,
}

impl Endpoints {
    /// Default endpoints for a region; "us" selects binance.us
    pub fn for_region(region: &str) -> Self {
        if region.eq_ignore_ascii_case("us") {
            Self {
                rest_url: "https://api.binance.us".to_string(),
                ws_url: "wss://stream.binance.us:9443".to_string(),
            }
        } else {
            Self {
                rest_url: "https://api.binance.com".to_string(),
                ws_url: "wss://stream.binance.com:9443".to_string(),
            }
        }
    }
}
