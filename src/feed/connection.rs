//! Connection handle ownership and close-and-recreate recovery

use super::{Connector, Credentials, FeedError};
use crate::telemetry::{record_connection, ConnectionEvent};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Authenticated exchange session used to open ticker subscriptions
///
/// Clones share identity and the closed flag. Two handles compare equal only
/// if they come from the same `open`.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    inner: Arc<HandleInner>,
}

#[derive(Debug)]
struct HandleInner {
    id: Uuid,
    rest_url: String,
    ws_url: String,
    authenticated: bool,
    opened_at: DateTime<Utc>,
    closed: AtomicBool,
}

impl ConnectionHandle {
    /// Create a live handle for the given endpoints
    pub fn new(rest_url: impl Into<String>, ws_url: impl Into<String>, authenticated: bool) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                id: Uuid::new_v4(),
                rest_url: rest_url.into(),
                ws_url: ws_url.into(),
                authenticated,
                opened_at: Utc::now(),
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn rest_url(&self) -> &str {
        &self.inner.rest_url
    }

    /// WebSocket base URL subscriptions are opened against
    pub fn ws_url(&self) -> &str {
        &self.inner.ws_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.authenticated
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.inner.opened_at
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Mark closed; returns true only for the call that performed the transition
    fn mark_closed(&self) -> bool {
        !self.inner.closed.swap(true, Ordering::AcqRel)
    }
}

impl PartialEq for ConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for ConnectionHandle {}

/// Sole owner of connection lifecycle
///
/// `recreate` is the only recovery primitive: the old handle is always closed
/// before a new one is opened, so there is never more than one live handle.
pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
}

impl ConnectionManager {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }

    /// Establish a new authenticated session
    pub async fn connect(&self, credentials: &Credentials) -> Result<ConnectionHandle, FeedError> {
        match self.connector.open(credentials).await {
            Ok(handle) => {
                tracing::info!(
                    handle = %handle.id(),
                    authenticated = handle.is_authenticated(),
                    "Exchange connection established"
                );
                record_connection(ConnectionEvent::Opened);
                Ok(handle)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Exchange connection failed");
                record_connection(ConnectionEvent::OpenFailed);
                Err(e)
            }
        }
    }

    /// Close `old` (best-effort) and open a replacement
    pub async fn recreate(
        &self,
        old: &ConnectionHandle,
        credentials: &Credentials,
    ) -> Result<ConnectionHandle, FeedError> {
        tracing::info!(handle = %old.id(), "Recreating exchange connection");
        self.close(old).await;
        self.connect(credentials).await
    }

    /// Release a handle; closing an already-closed handle is a no-op
    pub async fn close(&self, handle: &ConnectionHandle) {
        if !handle.mark_closed() {
            tracing::debug!(handle = %handle.id(), "Connection already closed");
            return;
        }

        if let Err(e) = self.connector.release(handle).await {
            tracing::warn!(handle = %handle.id(), error = %e, "Failed to release connection cleanly");
        }
        record_connection(ConnectionEvent::Closed);
        tracing::debug!(handle = %handle.id(), "Connection closed");
    }
}
