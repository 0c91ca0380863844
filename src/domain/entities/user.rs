//! User entity and repository trait.
//!
//! Maps to the `users` table in the database schema.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::presence::Status;
use crate::domain::value_objects::UserId;
use crate::shared::error::AppError;

/// Default font size of a fresh account.
pub const DEFAULT_FONT_SIZE: u32 = 12;

/// Identity and directory information visible to other users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    pub username: String,
    pub fullname: String,
    pub extension: Option<String>,
    pub enabled: bool,
}

/// Client preferences. Private to the owning user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub compact_view: bool,
    pub sound_disabled: bool,
    pub minimize_to_tray: bool,
    pub keep_open_windows: bool,
    pub font_size: u32,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            compact_view: false,
            sound_disabled: false,
            minimize_to_tray: false,
            keep_open_windows: true,
            font_size: DEFAULT_FONT_SIZE,
        }
    }
}

/// Represents a user account.
///
/// Maps to the `users` table:
/// - id: UUID PRIMARY KEY
/// - username: VARCHAR(50) NOT NULL UNIQUE
/// - fullname: VARCHAR(50) NOT NULL
/// - extension: VARCHAR(50) NULL
/// - enabled: BOOLEAN NOT NULL
/// - settings: JSONB NOT NULL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub details: UserDetails,
    #[serde(default)]
    pub settings: UserSettings,
}

impl User {
    /// New enabled account with default settings.
    pub fn new(username: impl Into<String>, fullname: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            details: UserDetails {
                username: username.into(),
                fullname: fullname.into(),
                extension: None,
                enabled: true,
            },
            settings: UserSettings::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.details.enabled
    }

    pub fn username(&self) -> &str {
        &self.details.username
    }
}

/// What a client sees about another user: directory details plus presence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: UserId,
    pub details: UserDetails,
    pub status: Status,
}

/// Repository trait for User data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by id.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, AppError>;

    /// Find a user by exact username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    /// Every stored user, enabled or not.
    async fn find_all(&self) -> Result<Vec<User>, AppError>;

    /// Insert a new user. Fails with `Conflict` on a duplicate username.
    async fn insert(&self, user: &User) -> Result<User, AppError>;

    /// Overwrite an existing user.
    async fn save(&self, user: &User) -> Result<User, AppError>;
}
