//! # Domain Value Objects
//!
//! Immutable value types that represent domain concepts without identity.
//!
//! ## Value Objects
//!
//! - **Ids**: typed UUID identifiers for users, groups, messages and sessions
//! - **ConversationKey**: order-independent key of a message stream

mod ids;

pub use ids::*;
