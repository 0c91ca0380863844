//! WebSocket Sessions
//!
//! Realtime delivery to connected clients at `/session/user/{user_id}`.

pub mod handler;
pub mod transport;

pub use handler::ws_handler;
pub use transport::{Outbound, WsTransport};
