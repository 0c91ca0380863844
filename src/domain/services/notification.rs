//! Optional broker backend mirroring outbound events.

use crate::domain::events::ServerEvent;

/// Routing key used for events addressed to every connected user.
pub const BROADCAST_ROUTING_KEY: &str = "all";

/// Fire-and-forget publisher. Failures are logged by the implementation
/// and never reported to the caller.
pub trait NotificationSink: Send + Sync {
    fn publish(&self, routing_key: &str, event: &ServerEvent);
}
