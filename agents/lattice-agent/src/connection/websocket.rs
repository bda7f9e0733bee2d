//! WebSocket Client
//!
//! Maintains the persistent connection to the controller with
//! auto-reconnect, registers the agent on each connection, dispatches
//! inbound frames to their handlers and drains outbound sends.

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::agent::intake::{CommandIntake, InboundMessage};
use crate::agent::registration::RegistrationState;
use crate::connection::protocol::{
    Envelope, RegistrationResponse, RegistrationStatus, COMMANDS_TOPIC,
    REGISTRATION_RESPONSES_TOPIC,
};
use crate::connection::transport::WsTransport;

const CONNECT_TIMEOUT_SECS: u64 = 30;
const OUTBOUND_CHANNEL_CAPACITY: usize = 100;

/// WebSocket client for controller communication.
pub struct WebSocketClient {
    url: String,
    agent_id: String,
    reconnect_interval_ms: u64,
    registration: RegistrationState,
    transport: WsTransport,
    intake: CommandIntake,
    stop: watch::Receiver<bool>,
}

impl WebSocketClient {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        url: &str,
        agent_id: &str,
        reconnect_interval_ms: u64,
        registration: RegistrationState,
        transport: WsTransport,
        intake: CommandIntake,
        stop: watch::Receiver<bool>,
    ) -> Self {
        Self {
            url: url.to_string(),
            agent_id: agent_id.to_string(),
            reconnect_interval_ms,
            registration,
            transport,
            intake,
            stop,
        }
    }

    /// Run the client with auto-reconnect until the stop signal is set.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            match self.connect_and_run().await {
                Ok(()) => {
                    info!("WebSocket connection closed gracefully");
                }
                Err(e) => {
                    error!(error = %e, "WebSocket connection error");
                }
            }

            // Registration does not survive a disconnect; senders observe
            // a closed transport until the next connection registers again.
            self.registration.set_registered(false);
            self.transport.detach();

            if *self.stop.borrow() {
                break;
            }

            info!(
                interval_ms = self.reconnect_interval_ms,
                "Waiting before reconnection attempt"
            );
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_millis(self.reconnect_interval_ms)) => {}
                _ = self.stop.changed() => {
                    if *self.stop.borrow() {
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    /// Connect and run the communication loop for one connection.
    async fn connect_and_run(&mut self) -> Result<()> {
        info!(url = %self.url, "Connecting to controller");

        let connect_timeout = Duration::from_secs(CONNECT_TIMEOUT_SECS);
        let ws_stream = timeout(connect_timeout, connect_async(&self.url))
            .await
            .context("Connection timeout")?
            .context("Failed to connect to WebSocket")?
            .0;

        info!("WebSocket connection established");

        let (mut write, mut read) = ws_stream.split();

        // Channel for outgoing frames; the transport handle feeds it.
        let (frame_tx, mut frame_rx) = mpsc::channel::<Envelope>(OUTBOUND_CHANNEL_CAPACITY);
        self.transport.attach(frame_tx);

        // Register with the controller on every new connection.
        let register = Envelope::register(&self.agent_id);
        write.send(Message::Text(register.to_json()?.into())).await?;
        debug!("Registration request sent");

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            if let Err(e) = self.handle_frame(&text) {
                                warn!(error = %e, "Failed to handle frame");
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            debug!("Received ping, sending pong");
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Pong(_))) => {
                            debug!("Received pong");
                        }
                        Some(Ok(Message::Close(frame))) => {
                            info!(?frame, "Received close frame");
                            break;
                        }
                        Some(Ok(Message::Binary(_))) => {
                            debug!("Received binary message (ignored)");
                        }
                        Some(Ok(Message::Frame(_))) => {
                            // Raw frame, typically not used
                        }
                        Some(Err(e)) => {
                            error!(error = %e, "WebSocket error");
                            return Err(e.into());
                        }
                        None => {
                            info!("WebSocket stream ended");
                            break;
                        }
                    }
                }

                outgoing = frame_rx.recv() => {
                    if let Some(frame) = outgoing {
                        debug!(destination = %frame.destination, "Sending frame to controller");
                        write.send(Message::Text(frame.to_json()?.into())).await?;
                    }
                }

                _ = self.stop.changed() => {
                    if *self.stop.borrow() {
                        info!("Stop signal received, closing connection");
                        let _ = write.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    /// Dispatch one inbound frame by destination.
    ///
    /// Command frames are applied synchronously so the queue mutation
    /// completes before the next frame is read.
    fn handle_frame(&self, text: &str) -> Result<()> {
        let envelope = Envelope::from_json(text).context("Failed to parse controller frame")?;

        match envelope.destination.as_str() {
            REGISTRATION_RESPONSES_TOPIC => {
                let response: RegistrationResponse = serde_json::from_value(envelope.payload)
                    .context("Failed to parse registration response")?;
                match response.status {
                    RegistrationStatus::Ok => {
                        info!("Registered with controller");
                        self.registration.set_registered(true);
                    }
                    RegistrationStatus::Failed => {
                        warn!(
                            reason = response.message.as_deref().unwrap_or(""),
                            "Controller rejected registration"
                        );
                        self.registration.set_registered(false);
                    }
                }
            }
            COMMANDS_TOPIC => {
                let message: InboundMessage = serde_json::from_value(envelope.payload)
                    .context("Failed to parse commands message")?;
                self.intake.on_message(message);
            }
            other => {
                debug!(destination = %other, "Ignoring frame for unhandled destination");
            }
        }

        Ok(())
    }
}
