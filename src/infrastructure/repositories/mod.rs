//! Repository Implementations
//!
//! Implementations of the domain repository traits.
//!
//! ## Available Repositories
//!
//! - **PgUserRepository / InMemoryUserRepository** - user accounts
//! - **PgGroupRepository / InMemoryGroupRepository** - groups and membership
//! - **PgMessageRepository / InMemoryMessageRepository** - direct messages
//! - **PgGroupMessageRepository / InMemoryGroupMessageRepository** - group messages
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use sqlx::PgPool;
//! use messenger_server::infrastructure::repositories::{PgMessageRepository, PgUserRepository};
//!
//! async fn setup_repositories(pool: PgPool) {
//!     let user_repo = PgUserRepository::new(pool.clone());
//!     let message_repo = PgMessageRepository::new(pool);
//! }
//! ```

pub mod group_repository;
pub mod memory;
pub mod message_repository;
pub mod user_repository;

pub use group_repository::PgGroupRepository;
pub use memory::{
    InMemoryGroupMessageRepository, InMemoryGroupRepository, InMemoryMessageRepository,
    InMemoryUserRepository,
};
pub use message_repository::{PgGroupMessageRepository, PgMessageRepository};
pub use user_repository::PgUserRepository;

use crate::shared::error::AppError;

/// Map a failed write, turning unique-key violations into `Conflict`.
pub(crate) fn map_write_error(error: sqlx::Error, entity: &str) -> AppError {
    match &error {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(format!("Duplicate {}", entity))
        }
        _ => AppError::Database(error),
    }
}
