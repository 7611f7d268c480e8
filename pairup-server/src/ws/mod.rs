//! WebSocket module for real-time matchmaking

mod connection;
mod protocol;

pub use connection::{WsConnection, ws_handler};
pub use protocol::{ClientMessage, ErrorMessage, ServerMessage};
