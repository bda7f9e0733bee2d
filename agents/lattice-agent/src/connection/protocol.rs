//! Message Protocol
//!
//! Defines the frames exchanged with the controller. Every frame is an
//! envelope carrying a destination name and an opaque JSON payload, in the
//! style of a topic-based publish/subscribe transport.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Topic on which command/cancellation messages arrive from the controller.
pub const COMMANDS_TOPIC: &str = "/user/commands";

/// Endpoint to which host status reports are sent.
pub const HOST_STATUS_REPORTS_ENDPOINT: &str = "/reports/host_status";

/// Endpoint to which the agent sends its registration request.
pub const REGISTRATION_ENDPOINT: &str = "/registration";

/// Topic on which the controller answers registration requests.
pub const REGISTRATION_RESPONSES_TOPIC: &str = "/user/registration_responses";

/// A frame on the wire: destination plus payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub destination: String,
    pub payload: serde_json::Value,
}

impl Envelope {
    pub fn new(destination: &str, payload: serde_json::Value) -> Self {
        Self {
            destination: destination.to_string(),
            payload,
        }
    }

    /// Build a registration request frame for this agent.
    pub fn register(agent_id: &str) -> Self {
        let payload = RegisterPayload {
            agent_id: agent_id.to_string(),
            hostname: hostname::get()
                .map(|h| h.to_string_lossy().to_string())
                .unwrap_or_else(|_| "unknown".to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
        };
        // Serializing a plain struct of strings and a timestamp cannot fail.
        Self::new(
            REGISTRATION_ENDPOINT,
            serde_json::to_value(payload).unwrap_or_default(),
        )
    }

    /// Serialize the frame to its wire form.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse a frame from its wire form.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Registration request sent once per connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
    pub agent_id: String,
    pub hostname: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

/// Controller's answer to a registration request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub status: RegistrationStatus,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RegistrationStatus {
    Ok,
    Failed,
}
