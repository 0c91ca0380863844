//! Domain Services
//!
//! Contracts for collaborators that sit outside the entity model.

mod notification;

pub use notification::{NotificationSink, BROADCAST_ROUTING_KEY};
