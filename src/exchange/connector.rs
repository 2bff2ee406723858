//! Binance implementation of the feed's `Connector`

use super::{BinanceRestClient, Endpoints};
use crate::feed::{ConnectionHandle, Connector, Credentials, FeedError};
use async_trait::async_trait;

/// Opens sessions after proving reachability and, with keys, authentication
pub struct BinanceConnector {
    rest: BinanceRestClient,
    ws_url: String,
}

impl BinanceConnector {
    pub fn new(endpoints: &Endpoints) -> anyhow::Result<Self> {
        Ok(Self {
            rest: BinanceRestClient::new(&endpoints.rest_url)?,
            ws_url: endpoints.ws_url.clone(),
        })
    }
}

#[async_trait]
impl Connector for BinanceConnector {
    async fn open(&self, credentials: &Credentials) -> Result<ConnectionHandle, FeedError> {
        self.rest.ping().await?;

        let authenticated = if credentials.has_keys() {
            self.rest.account(credentials).await?;
            true
        } else {
            tracing::warn!("No API credentials configured, using public streams only");
            false
        };

        Ok(ConnectionHandle::new(
            self.rest.base_url(),
            &self.ws_url,
            authenticated,
        ))
    }

    async fn release(&self, handle: &ConnectionHandle) -> Result<(), FeedError> {
        // Ticker streams are closed per round; the session holds nothing server-side
        tracing::debug!(handle = %handle.id(), "Releasing Binance session");
        Ok(())
    }
}
