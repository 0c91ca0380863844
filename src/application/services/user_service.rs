//! User Service
//!
//! Account creation, directory lookups, profile updates and enabling or
//! disabling accounts. Directory changes are announced to every live session.

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::services::presence_service::PresenceService;
use crate::config::LimitSettings;
use crate::domain::events::{UserDetailsChanged, UserRef};
use crate::domain::{ServerEvent, User, UserId, UserInfo, UserSettings};
use crate::infrastructure::cache::UserDirectory;
use crate::infrastructure::realtime::Broadcaster;
use crate::shared::error::AppError;

/// User service trait
#[async_trait]
pub trait UserService: Send + Sync {
    /// Create a new enabled account
    async fn create_user(&self, new_user: NewUserDto) -> Result<User, UserError>;

    /// Get user by ID
    async fn get_user(&self, user_id: UserId) -> Result<User, UserError>;

    /// Get user by username
    async fn get_user_by_username(&self, username: &str) -> Result<User, UserError>;

    /// Every enabled user with their current presence
    async fn all_user_info(&self) -> Result<Vec<UserInfo>, UserError>;

    async fn user_info(&self, user_id: UserId) -> Result<UserInfo, UserError>;

    /// Update user profile
    async fn update_profile(
        &self,
        user_id: UserId,
        update: UpdateProfileDto,
    ) -> Result<User, UserError>;

    async fn enable_user(&self, user_id: UserId) -> Result<User, UserError>;

    /// Disable the account and close all of its sessions
    async fn disable_user(&self, user_id: UserId) -> Result<User, UserError>;

    /// Load every user into the directory cache
    async fn warm_cache(&self) -> Result<usize, UserError>;
}

/// New account request
#[derive(Debug, Clone)]
pub struct NewUserDto {
    pub username: String,
    pub fullname: String,
    pub extension: Option<String>,
}

/// Update profile request
#[derive(Debug, Clone, Default)]
pub struct UpdateProfileDto {
    pub fullname: Option<String>,
    pub extension: Option<String>,
    pub settings: Option<UserSettings>,
}

/// User service errors
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,

    #[error("Username already taken")]
    UsernameTaken,

    #[error("User is disabled")]
    Disabled,

    #[error("User is already enabled")]
    AlreadyEnabled,

    #[error("User is already disabled")]
    AlreadyDisabled,

    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Repository failure: {0}")]
    Repository(String),
}

impl From<UserError> for AppError {
    fn from(error: UserError) -> Self {
        match error {
            UserError::NotFound => AppError::NotFound(error.to_string()),
            UserError::UsernameTaken | UserError::AlreadyEnabled | UserError::AlreadyDisabled => {
                AppError::Conflict(error.to_string())
            }
            UserError::Repository(msg) => AppError::Repository(msg),
            UserError::Disabled | UserError::Invalid { .. } => AppError::Invalid(error.to_string()),
        }
    }
}

/// UserService implementation
pub struct UserServiceImpl {
    users: Arc<UserDirectory>,
    presence: Arc<dyn PresenceService>,
    broadcaster: Arc<Broadcaster>,
    limits: LimitSettings,
}

impl UserServiceImpl {
    pub fn new(
        users: Arc<UserDirectory>,
        presence: Arc<dyn PresenceService>,
        broadcaster: Arc<Broadcaster>,
        limits: LimitSettings,
    ) -> Self {
        Self {
            users,
            presence,
            broadcaster,
            limits,
        }
    }

    fn check_name(&self, field: &'static str, value: &str) -> Result<(), UserError> {
        if value.trim().is_empty() {
            return Err(UserError::Invalid {
                field,
                reason: "must not be blank".to_string(),
            });
        }
        if value.chars().count() > self.limits.max_name_length {
            return Err(UserError::Invalid {
                field,
                reason: format!("must be at most {} characters", self.limits.max_name_length),
            });
        }
        Ok(())
    }

    async fn load(&self, user_id: UserId) -> Result<User, UserError> {
        self.users
            .get(user_id)
            .await
            .map_err(|e| UserError::Repository(e.to_string()))?
            .ok_or(UserError::NotFound)
    }

    async fn store(&self, user: User) -> Result<User, UserError> {
        self.users
            .update(user)
            .await
            .map_err(|e| UserError::Repository(e.to_string()))
    }

    fn info(&self, user: User) -> UserInfo {
        UserInfo {
            id: user.id,
            status: self.presence.current_status(user.id),
            details: user.details,
        }
    }
}

#[async_trait]
impl UserService for UserServiceImpl {
    async fn create_user(&self, new_user: NewUserDto) -> Result<User, UserError> {
        self.check_name("username", &new_user.username)?;
        self.check_name("fullname", &new_user.fullname)?;

        let mut user = User::new(new_user.username.trim(), new_user.fullname.trim());
        user.details.extension = new_user.extension;

        let created = self.users.create(user).await.map_err(|e| match e {
            AppError::Conflict(_) => UserError::UsernameTaken,
            other => UserError::Repository(other.to_string()),
        })?;

        self.broadcaster
            .send_to_all(&ServerEvent::NewUser(created.clone()));
        Ok(created)
    }

    async fn get_user(&self, user_id: UserId) -> Result<User, UserError> {
        self.load(user_id).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<User, UserError> {
        self.users
            .get_by_username(username)
            .await
            .map_err(|e| UserError::Repository(e.to_string()))?
            .ok_or(UserError::NotFound)
    }

    async fn all_user_info(&self) -> Result<Vec<UserInfo>, UserError> {
        let users = self
            .users
            .all()
            .await
            .map_err(|e| UserError::Repository(e.to_string()))?;

        Ok(users
            .into_iter()
            .filter(User::is_enabled)
            .map(|user| self.info(user))
            .collect())
    }

    async fn user_info(&self, user_id: UserId) -> Result<UserInfo, UserError> {
        let user = self.load(user_id).await?;
        Ok(self.info(user))
    }

    async fn update_profile(
        &self,
        user_id: UserId,
        update: UpdateProfileDto,
    ) -> Result<User, UserError> {
        let mut user = self.load(user_id).await?;
        if !user.is_enabled() {
            return Err(UserError::Disabled);
        }
        let previous = user.details.clone();

        if let Some(fullname) = update.fullname {
            self.check_name("fullname", &fullname)?;
            user.details.fullname = fullname.trim().to_string();
        }
        if let Some(extension) = update.extension {
            let extension = extension.trim().to_string();
            user.details.extension = (!extension.is_empty()).then_some(extension);
        }
        if let Some(settings) = update.settings {
            if settings.font_size == 0 || settings.font_size > self.limits.max_font_size {
                return Err(UserError::Invalid {
                    field: "fontSize",
                    reason: format!("must be between 1 and {}", self.limits.max_font_size),
                });
            }
            user.settings = settings;
        }

        let updated = self.store(user).await?;

        if updated.details != previous {
            self.broadcaster.send_to_all_except(
                user_id,
                &ServerEvent::UpdateUserDetails(UserDetailsChanged {
                    id: user_id,
                    details: updated.details.clone(),
                }),
            );
        }
        Ok(updated)
    }

    async fn enable_user(&self, user_id: UserId) -> Result<User, UserError> {
        let mut user = self.load(user_id).await?;
        if user.is_enabled() {
            return Err(UserError::AlreadyEnabled);
        }

        user.details.enabled = true;
        let updated = self.store(user).await?;
        tracing::info!(user_id = %user_id, "User enabled");

        self.broadcaster
            .send_to_all_except(user_id, &ServerEvent::NewUser(updated.clone()));
        Ok(updated)
    }

    async fn disable_user(&self, user_id: UserId) -> Result<User, UserError> {
        let mut user = self.load(user_id).await?;
        if !user.is_enabled() {
            return Err(UserError::AlreadyDisabled);
        }

        user.details.enabled = false;
        let updated = self.store(user).await?;

        let closed = self.presence.disconnect_user(user_id, "account disabled").await;
        tracing::info!(user_id = %user_id, closed_sessions = closed, "User disabled");

        self.broadcaster
            .send_to_all_except(user_id, &ServerEvent::DisableUser(UserRef { id: user_id }));
        Ok(updated)
    }

    async fn warm_cache(&self) -> Result<usize, UserError> {
        self.users
            .load_all()
            .await
            .map_err(|e| UserError::Repository(e.to_string()))
    }
}
