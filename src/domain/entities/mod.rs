//! # Domain Entities
//!
//! Core domain entities of the messenger.
//!
//! ## Core Entities
//!
//! - **User**: account with directory details and client settings
//! - **Group**: a named set of users sharing one conversation
//! - **Message / GroupMessage**: sequenced messages of a conversation
//! - **PresenceStatus**: a reported status and when it was reported
//!
//! ## Repository Traits
//!
//! Each persisted entity has an associated repository trait defining data
//! access operations. These traits are implemented in the infrastructure
//! layer.

mod group;
mod message;
mod presence;
mod session;
mod user;

pub use group::{Group, GroupRepository};
pub use message::{GroupMessage, GroupMessageRepository, Message, MessageRepository, Page};
pub use presence::{PresenceStatus, Status};
pub use session::{DeliveryError, SessionTransport};
pub use user::{User, UserDetails, UserInfo, UserRepository, UserSettings, DEFAULT_FONT_SIZE};

#[cfg(test)]
pub use group::MockGroupRepository;
#[cfg(test)]
pub use message::{MockGroupMessageRepository, MockMessageRepository};
#[cfg(test)]
pub use user::MockUserRepository;
