//! Controller connection layer

pub mod protocol;
pub mod transport;
pub mod websocket;
