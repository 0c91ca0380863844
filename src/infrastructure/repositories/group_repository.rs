//! Group Repository Implementation
//!
//! Members are stored inline as a UUID array.

use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::map_write_error;
use crate::domain::{Group, GroupId, GroupRepository, UserId};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct GroupRow {
    id: Uuid,
    name: String,
    user_ids: Vec<Uuid>,
    enabled: bool,
}

impl GroupRow {
    fn into_group(self) -> Group {
        Group {
            id: GroupId::from_uuid(self.id),
            name: self.name,
            user_ids: self.user_ids.into_iter().map(UserId::from_uuid).collect::<BTreeSet<_>>(),
            enabled: self.enabled,
        }
    }
}

fn member_array(group: &Group) -> Vec<Uuid> {
    group.user_ids.iter().map(|id| id.0).collect()
}

#[derive(Clone)]
pub struct PgGroupRepository {
    pool: PgPool,
}

impl PgGroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupRepository for PgGroupRepository {
    async fn find_by_id(&self, id: GroupId) -> Result<Option<Group>, AppError> {
        let row = sqlx::query_as::<_, GroupRow>(
            "SELECT id, name, user_ids, enabled FROM groups WHERE id = $1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(GroupRow::into_group))
    }

    async fn insert(&self, group: &Group) -> Result<Group, AppError> {
        let row = sqlx::query_as::<_, GroupRow>(
            r#"
            INSERT INTO groups (id, name, user_ids, enabled)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, user_ids, enabled
            "#,
        )
        .bind(group.id.0)
        .bind(&group.name)
        .bind(member_array(group))
        .bind(group.enabled)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "group"))?;

        Ok(row.into_group())
    }

    async fn save(&self, group: &Group) -> Result<Group, AppError> {
        let row = sqlx::query_as::<_, GroupRow>(
            r#"
            UPDATE groups SET name = $2, user_ids = $3, enabled = $4
            WHERE id = $1
            RETURNING id, name, user_ids, enabled
            "#,
        )
        .bind(group.id.0)
        .bind(&group.name)
        .bind(member_array(group))
        .bind(group.enabled)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Group {} not found", group.id)))?;

        Ok(row.into_group())
    }
}
