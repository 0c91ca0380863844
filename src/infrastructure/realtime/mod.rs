//! Realtime Core
//!
//! Live session bookkeeping and event fan-out.

pub mod broadcaster;
pub mod presence;
pub mod registry;

pub use broadcaster::{Broadcaster, DeliveryReport};
pub use presence::PresenceAggregator;
pub use registry::{SessionEntry, SessionRegistry};
