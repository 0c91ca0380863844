//! Live session transport contract.

use std::fmt::Debug;

use crate::domain::events::ServerEvent;

/// Delivery through a transport failed; the connection is gone or full.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("transport closed")]
    Closed,

    #[error("transport rejected event: {0}")]
    Rejected(String),
}

/// Write side of one client connection.
///
/// `send` must not block on network I/O: implementations enqueue the event
/// and let a per-connection task perform the actual write.
pub trait SessionTransport: Send + Sync + Debug {
    fn send(&self, event: &ServerEvent) -> Result<(), DeliveryError>;

    /// Ask the connection to terminate. Idempotent.
    fn close(&self);
}
