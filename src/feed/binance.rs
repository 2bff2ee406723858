//! Binance WebSocket ticker source

use super::{ConnectionHandle, FeedError, Subscription, Symbol, TickerMessage, TickerSource};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use futures_util::StreamExt;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

/// Upper bound on the close handshake of a finished subscription
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Binance 24h rolling ticker message structure
#[derive(Debug, Deserialize)]
struct BinanceTickerMessage {
    /// Event type
    #[serde(rename = "e")]
    event_type: String,
    /// Event time (milliseconds)
    #[serde(rename = "E")]
    event_time: i64,
    /// Symbol
    #[serde(rename = "s")]
    symbol: String,
    /// Last price
    #[serde(rename = "c")]
    last_price: String,
}

/// Opens one `<symbol>@ticker` stream per round
#[derive(Debug, Default, Clone)]
pub struct BinanceTickerSource;

impl BinanceTickerSource {
    pub fn new() -> Self {
        Self
    }

    /// Build the WebSocket URL for a symbol's ticker stream
    fn build_stream_url(ws_url: &str, symbol: &Symbol) -> String {
        format!(
            "{}/ws/{}@ticker",
            ws_url.trim_end_matches('/'),
            symbol.stream_name()
        )
    }

    /// Parse a Binance ticker message
    fn parse_message(msg: &str) -> Result<TickerMessage, FeedError> {
        let ticker: BinanceTickerMessage =
            serde_json::from_str(msg).map_err(|e| FeedError::Decode(e.to_string()))?;

        if ticker.event_type != "24hrTicker" {
            return Err(FeedError::Decode(format!(
                "unexpected event type {}",
                ticker.event_type
            )));
        }

        let price = Decimal::from_str(&ticker.last_price)
            .map_err(|e| FeedError::Decode(format!("price {:?}: {}", ticker.last_price, e)))?;
        let event_time = Utc
            .timestamp_millis_opt(ticker.event_time)
            .single()
            .ok_or_else(|| FeedError::Decode(format!("event time {}", ticker.event_time)))?;

        Ok(TickerMessage {
            symbol: Symbol::new(ticker.symbol),
            price,
            event_time,
        })
    }
}

#[async_trait]
impl TickerSource for BinanceTickerSource {
    async fn subscribe(
        &self,
        handle: &ConnectionHandle,
        symbol: &Symbol,
    ) -> Result<Box<dyn Subscription>, FeedError> {
        let url = Self::build_stream_url(handle.ws_url(), symbol);
        tracing::debug!(%url, handle = %handle.id(), "Opening ticker stream");

        let (stream, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| FeedError::Subscribe(e.to_string()))?;

        Ok(Box::new(BinanceSubscription {
            stream,
            closed: false,
        }))
    }
}

struct BinanceSubscription {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    closed: bool,
}

#[async_trait]
impl Subscription for BinanceSubscription {
    async fn recv(&mut self) -> Result<Option<TickerMessage>, FeedError> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return BinanceTickerSource::parse_message(&text).map(Some);
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => {
                    // Ping/pong and binary frames carry no ticker data
                }
                Some(Err(e)) => return Err(FeedError::Transport(e.to_string())),
            }
        }
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        match tokio::time::timeout(CLOSE_TIMEOUT, self.stream.close(None)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!(error = %e, "Ticker stream close failed"),
            Err(_) => tracing::debug!("Ticker stream close timed out"),
        }
    }
}
