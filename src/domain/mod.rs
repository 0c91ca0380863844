//! # Domain Layer
//!
//! The domain layer contains the core types of the messenger.
//! It is independent of any external frameworks or infrastructure concerns.
//!
//! ## Structure
//!
//! - **entities**: users, groups, messages, presence and their repositories
//! - **value_objects**: typed identifiers and conversation keys
//! - **events**: outbound events delivered to live sessions
//! - **services**: collaborator contracts (notification sink)

pub mod entities;
pub mod events;
pub mod services;
pub mod value_objects;

// Re-export commonly used types
pub use entities::*;
pub use events::ServerEvent;
pub use value_objects::*;
