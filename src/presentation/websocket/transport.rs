//! Session transport over a WebSocket connection.
//!
//! Events are queued on an unbounded channel drained by the connection's
//! writer task, so `send` never blocks the caller.

use tokio::sync::mpsc;

use crate::domain::{DeliveryError, ServerEvent, SessionTransport};

/// Instruction for the connection's writer task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Event(ServerEvent),
    Close,
}

#[derive(Debug)]
pub struct WsTransport {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl WsTransport {
    pub fn new(tx: mpsc::UnboundedSender<Outbound>) -> Self {
        Self { tx }
    }
}

impl SessionTransport for WsTransport {
    fn send(&self, event: &ServerEvent) -> Result<(), DeliveryError> {
        self.tx
            .send(Outbound::Event(event.clone()))
            .map_err(|_| DeliveryError::Closed)
    }

    fn close(&self) {
        // Writer already gone means the socket is closed anyway
        let _ = self.tx.send(Outbound::Close);
    }
}
