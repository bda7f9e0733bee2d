//! Lattice Agent Library
//!
//! This crate provides the host-side coordination layer of the Lattice
//! agent: change-only host status reporting, command/cancellation intake
//! from the controller, and the shared command queue binding them to the
//! command executor.

pub mod agent;
pub mod cli;
pub mod connection;
pub mod status;

// Re-exports for convenience
pub use agent::intake::{CommandIntake, InboundMessage};
pub use agent::queue::{CancelRequest, Command, CommandQueue};
pub use agent::registration::RegistrationState;
pub use cli::config::Config;
pub use connection::protocol::Envelope;
pub use connection::transport::{Transport, TransportError, WsTransport};
pub use connection::websocket::WebSocketClient;
pub use status::host::{HostSnapshotSource, SnapshotSource};
pub use status::report::Report;
pub use status::reporter::StatusReporter;
