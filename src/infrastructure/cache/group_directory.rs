//! Read-through cache of groups.

use std::sync::Arc;

use dashmap::DashMap;

use crate::domain::{Group, GroupId, GroupRepository};
use crate::shared::error::AppError;

pub struct GroupDirectory {
    repo: Arc<dyn GroupRepository>,
    by_id: DashMap<GroupId, Group>,
}

impl GroupDirectory {
    pub fn new(repo: Arc<dyn GroupRepository>) -> Self {
        Self {
            repo,
            by_id: DashMap::new(),
        }
    }

    pub async fn get(&self, id: GroupId) -> Result<Option<Group>, AppError> {
        if let Some(group) = self.by_id.get(&id) {
            return Ok(Some(group.value().clone()));
        }

        let loaded = self.repo.find_by_id(id).await?;
        if let Some(group) = &loaded {
            self.by_id.insert(group.id, group.clone());
        }
        Ok(loaded)
    }

    pub async fn create(&self, group: Group) -> Result<Group, AppError> {
        let stored = self.repo.insert(&group).await?;
        self.by_id.insert(stored.id, stored.clone());
        Ok(stored)
    }

    pub async fn update(&self, group: Group) -> Result<Group, AppError> {
        let stored = self.repo.save(&group).await?;
        self.by_id.insert(stored.id, stored.clone());
        Ok(stored)
    }
}
