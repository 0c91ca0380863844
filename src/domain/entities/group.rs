//! Group entity and repository trait.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{GroupId, UserId};
use crate::shared::error::AppError;

/// A named set of users sharing one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub user_ids: BTreeSet<UserId>,
    pub enabled: bool,
}

impl Group {
    pub fn new(name: impl Into<String>, user_ids: BTreeSet<UserId>) -> Self {
        Self {
            id: GroupId::new(),
            name: name.into(),
            user_ids,
            enabled: true,
        }
    }

    pub fn has_member(&self, user_id: UserId) -> bool {
        self.user_ids.contains(&user_id)
    }
}

/// Repository trait for Group data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GroupRepository: Send + Sync {
    async fn find_by_id(&self, id: GroupId) -> Result<Option<Group>, AppError>;

    async fn insert(&self, group: &Group) -> Result<Group, AppError>;

    async fn save(&self, group: &Group) -> Result<Group, AppError>;
}
