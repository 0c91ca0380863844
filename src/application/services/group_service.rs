//! Group Service
//!
//! Group creation and membership changes. Every change is pushed to the
//! affected members' live sessions.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::LimitSettings;
use crate::domain::events::{GroupUser, GroupUsers};
use crate::domain::{Group, GroupId, ServerEvent, UserId};
use crate::infrastructure::cache::{GroupDirectory, UserDirectory};
use crate::infrastructure::realtime::Broadcaster;
use crate::shared::error::AppError;

/// Smallest membership a new group may have
pub const MIN_GROUP_SIZE: usize = 2;

/// Group service trait
#[async_trait]
pub trait GroupService: Send + Sync {
    /// Create a group of the given enabled users
    async fn create_group(&self, name: &str, user_ids: Vec<UserId>) -> Result<Group, GroupError>;

    async fn get_group(&self, group_id: GroupId) -> Result<Group, GroupError>;

    /// Add users to a group. Unknown, disabled and existing members are skipped.
    async fn add_users(&self, group_id: GroupId, user_ids: Vec<UserId>)
        -> Result<Group, GroupError>;

    /// Remove one member. A group left empty is disabled.
    async fn remove_user(&self, group_id: GroupId, user_id: UserId) -> Result<Group, GroupError>;
}

/// Group service errors
#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    #[error("Group not found")]
    NotFound,

    #[error("Group is disabled")]
    Disabled,

    #[error("Invalid group name: {0}")]
    InvalidName(String),

    #[error("A group needs at least {} enabled members", MIN_GROUP_SIZE)]
    NotEnoughMembers,

    #[error("User is not a member of this group")]
    NotMember,

    #[error("Repository failure: {0}")]
    Repository(String),
}

impl From<GroupError> for AppError {
    fn from(error: GroupError) -> Self {
        match error {
            GroupError::NotFound => AppError::NotFound(error.to_string()),
            GroupError::Repository(msg) => AppError::Repository(msg),
            _ => AppError::Invalid(error.to_string()),
        }
    }
}

/// GroupService implementation
pub struct GroupServiceImpl {
    users: Arc<UserDirectory>,
    groups: Arc<GroupDirectory>,
    broadcaster: Arc<Broadcaster>,
    limits: LimitSettings,
}

impl GroupServiceImpl {
    pub fn new(
        users: Arc<UserDirectory>,
        groups: Arc<GroupDirectory>,
        broadcaster: Arc<Broadcaster>,
        limits: LimitSettings,
    ) -> Self {
        Self {
            users,
            groups,
            broadcaster,
            limits,
        }
    }

    /// The subset of `user_ids` that exist and are enabled.
    async fn enabled_users(&self, user_ids: Vec<UserId>) -> Result<BTreeSet<UserId>, GroupError> {
        let mut enabled = BTreeSet::new();
        for user_id in user_ids {
            let user = self
                .users
                .get(user_id)
                .await
                .map_err(|e| GroupError::Repository(e.to_string()))?;
            match user {
                Some(user) if user.is_enabled() => {
                    enabled.insert(user_id);
                }
                _ => tracing::debug!(user_id = %user_id, "Skipping unknown or disabled user"),
            }
        }
        Ok(enabled)
    }

    async fn load_enabled(&self, group_id: GroupId) -> Result<Group, GroupError> {
        let group = self
            .groups
            .get(group_id)
            .await
            .map_err(|e| GroupError::Repository(e.to_string()))?
            .ok_or(GroupError::NotFound)?;

        if !group.enabled {
            return Err(GroupError::Disabled);
        }
        Ok(group)
    }

    fn members(group: &Group) -> Vec<UserId> {
        group.user_ids.iter().copied().collect()
    }
}

#[async_trait]
impl GroupService for GroupServiceImpl {
    async fn create_group(&self, name: &str, user_ids: Vec<UserId>) -> Result<Group, GroupError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GroupError::InvalidName("must not be blank".to_string()));
        }
        if name.chars().count() > self.limits.max_name_length {
            return Err(GroupError::InvalidName(format!(
                "must be at most {} characters",
                self.limits.max_name_length
            )));
        }

        let members = self.enabled_users(user_ids).await?;
        if members.len() < MIN_GROUP_SIZE {
            return Err(GroupError::NotEnoughMembers);
        }

        let group = self
            .groups
            .create(Group::new(name, members))
            .await
            .map_err(|e| GroupError::Repository(e.to_string()))?;
        tracing::info!(group_id = %group.id, members = group.user_ids.len(), "Group created");

        self.broadcaster
            .send_to_users(&Self::members(&group), &ServerEvent::NewGroup(group.clone()));
        Ok(group)
    }

    async fn get_group(&self, group_id: GroupId) -> Result<Group, GroupError> {
        self.groups
            .get(group_id)
            .await
            .map_err(|e| GroupError::Repository(e.to_string()))?
            .ok_or(GroupError::NotFound)
    }

    async fn add_users(
        &self,
        group_id: GroupId,
        user_ids: Vec<UserId>,
    ) -> Result<Group, GroupError> {
        let mut group = self.load_enabled(group_id).await?;

        let added: Vec<UserId> = self
            .enabled_users(user_ids)
            .await?
            .into_iter()
            .filter(|user_id| !group.has_member(*user_id))
            .collect();
        if added.is_empty() {
            return Ok(group);
        }

        group.user_ids.extend(added.iter().copied());
        let group = self
            .groups
            .update(group)
            .await
            .map_err(|e| GroupError::Repository(e.to_string()))?;

        self.broadcaster.send_to_users(
            &Self::members(&group),
            &ServerEvent::UsersAddedToGroup(GroupUsers {
                group_id,
                user_ids: added,
            }),
        );
        Ok(group)
    }

    async fn remove_user(&self, group_id: GroupId, user_id: UserId) -> Result<Group, GroupError> {
        let mut group = self.load_enabled(group_id).await?;
        if !group.user_ids.remove(&user_id) {
            return Err(GroupError::NotMember);
        }
        if group.user_ids.is_empty() {
            group.enabled = false;
        }

        let group = self
            .groups
            .update(group)
            .await
            .map_err(|e| GroupError::Repository(e.to_string()))?;

        let mut recipients = Self::members(&group);
        recipients.push(user_id);
        self.broadcaster.send_to_users(
            &recipients,
            &ServerEvent::UserRemovedFromGroup(GroupUser { group_id, user_id }),
        );
        Ok(group)
    }
}
