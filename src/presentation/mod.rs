//! Presentation Layer
//!
//! HTTP routes and WebSocket session handlers.

pub mod http;
pub mod middleware;
pub mod websocket;
