//! Application Services
//!
//! Business logic services that coordinate domain operations.
//!
//! ## Available Services
//!
//! - **PresenceService**: Session lifecycle and aggregate presence
//! - **MessageService**: Direct and group messages, typing pings, unread counts
//! - **UserService**: Accounts, profiles and the user directory
//! - **GroupService**: Group creation and membership

pub mod group_service;
pub mod message_service;
pub mod presence_service;
pub mod user_service;

// Re-export presence service types
pub use presence_service::{PresenceError, PresenceService, PresenceServiceImpl};

// Re-export message service types
pub use message_service::{MessageError, MessageService, MessageServiceImpl};

// Re-export user service types
pub use user_service::{NewUserDto, UpdateProfileDto, UserError, UserService, UserServiceImpl};

// Re-export group service types
pub use group_service::{GroupError, GroupService, GroupServiceImpl, MIN_GROUP_SIZE};
