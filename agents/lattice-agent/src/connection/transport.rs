//! Transport
//!
//! Abstraction over the persistent controller connection used by senders
//! like the status reporter. A send can fail with a distinguished
//! "connection already closed" condition, which callers are expected to
//! treat as benign when the controller disconnected mid-send.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::connection::protocol::Envelope;

/// Failure modes of a transport send.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The underlying connection was torn down before or during the send.
    /// Expected whenever the controller disconnects; callers swallow it.
    #[error("connection is already closed")]
    ConnectionClosed,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Sends a message to a named destination on the controller connection.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        destination: &str,
        payload: serde_json::Value,
    ) -> Result<(), TransportError>;
}

/// Transport handle backed by the WebSocket client's outbound channel.
///
/// The handle outlives individual connections: the client attaches a fresh
/// sender on every (re)connect and detaches it on disconnect. Sends while
/// detached fail with [`TransportError::ConnectionClosed`].
#[derive(Debug, Clone, Default)]
pub struct WsTransport {
    outbound: Arc<RwLock<Option<mpsc::Sender<Envelope>>>>,
}

impl WsTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the outbound sender for the current connection.
    pub(crate) fn attach(&self, sender: mpsc::Sender<Envelope>) {
        *self.outbound.write() = Some(sender);
    }

    /// Drop the outbound sender; subsequent sends report ConnectionClosed.
    pub(crate) fn detach(&self) {
        *self.outbound.write() = None;
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn send(
        &self,
        destination: &str,
        payload: serde_json::Value,
    ) -> Result<(), TransportError> {
        // Clone the sender out so the lock is not held across the await.
        let sender = self
            .outbound
            .read()
            .clone()
            .ok_or(TransportError::ConnectionClosed)?;

        sender
            .send(Envelope::new(destination, payload))
            .await
            .map_err(|_| TransportError::ConnectionClosed)
    }
}
