//! Message Repository Implementation
//!
//! PostgreSQL storage of direct and group messages with time-keyed
//! pagination. Each conversation's ordering key is unique, so an insert that
//! collides on `(conversation, time)` is reported as a conflict.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::map_write_error;
use crate::domain::{
    ConversationKey, GroupId, GroupMessage, GroupMessageRepository, Message, MessageId,
    MessageRepository, Page, UserId,
};
use crate::shared::error::AppError;

/// Internal row type for direct message queries.
#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: Uuid,
    sender_id: Uuid,
    recipient_id: Uuid,
    conversation_key: String,
    content: String,
    time: i64,
    deleted: bool,
}

impl MessageRow {
    fn into_message(self) -> Message {
        Message {
            id: MessageId::from_uuid(self.id),
            from: UserId::from_uuid(self.sender_id),
            to: UserId::from_uuid(self.recipient_id),
            conversation: ConversationKey::from_raw(self.conversation_key),
            content: self.content,
            time: self.time,
            deleted: self.deleted,
        }
    }
}

/// Internal row type for group message queries.
#[derive(Debug, sqlx::FromRow)]
struct GroupMessageRow {
    id: Uuid,
    sender_id: Uuid,
    group_id: Uuid,
    content: String,
    time: i64,
    deleted: bool,
}

impl GroupMessageRow {
    fn into_message(self) -> GroupMessage {
        GroupMessage {
            id: MessageId::from_uuid(self.id),
            from: UserId::from_uuid(self.sender_id),
            group_id: GroupId::from_uuid(self.group_id),
            content: self.content,
            time: self.time,
            deleted: self.deleted,
        }
    }
}

/// Rows fetched per page: one extra to learn whether more exist.
fn overfetch(limit: usize) -> i64 {
    (limit as i64).saturating_add(1)
}

/// PostgreSQL direct message repository.
#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn insert(&self, message: &Message) -> Result<Message, AppError> {
        let row = sqlx::query_as::<_, MessageRow>(
            r#"
            INSERT INTO messages (id, sender_id, recipient_id, conversation_key, content, time, deleted)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, sender_id, recipient_id, conversation_key, content, time, deleted
            "#,
        )
        .bind(message.id.0)
        .bind(message.from.0)
        .bind(message.to.0)
        .bind(message.conversation.as_str())
        .bind(&message.content)
        .bind(message.time)
        .bind(message.deleted)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "message"))?;

        Ok(row.into_message())
    }

    async fn find_by_id(&self, id: MessageId) -> Result<Option<Message>, AppError> {
        let row = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT id, sender_id, recipient_id, conversation_key, content, time, deleted
            FROM messages
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(MessageRow::into_message))
    }

    async fn page_before_time(
        &self,
        conversation: &ConversationKey,
        before: i64,
        limit: usize,
    ) -> Result<Page<Message>, AppError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT id, sender_id, recipient_id, conversation_key, content, time, deleted
            FROM messages
            WHERE conversation_key = $1 AND time < $2 AND NOT deleted
            ORDER BY time DESC
            LIMIT $3
            "#,
        )
        .bind(conversation.as_str())
        .bind(before)
        .bind(overfetch(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::from_overfetch(
            rows.into_iter().map(MessageRow::into_message).collect(),
            limit,
        ))
    }

    async fn count_after_time(
        &self,
        conversation: &ConversationKey,
        after: i64,
    ) -> Result<u64, AppError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM messages
            WHERE conversation_key = $1 AND time >= $2 AND NOT deleted
            "#,
        )
        .bind(conversation.as_str())
        .bind(after)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.max(0) as u64)
    }
}

/// PostgreSQL group message repository.
#[derive(Clone)]
pub struct PgGroupMessageRepository {
    pool: PgPool,
}

impl PgGroupMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupMessageRepository for PgGroupMessageRepository {
    async fn insert(&self, message: &GroupMessage) -> Result<GroupMessage, AppError> {
        let row = sqlx::query_as::<_, GroupMessageRow>(
            r#"
            INSERT INTO group_messages (id, sender_id, group_id, content, time, deleted)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, sender_id, group_id, content, time, deleted
            "#,
        )
        .bind(message.id.0)
        .bind(message.from.0)
        .bind(message.group_id.0)
        .bind(&message.content)
        .bind(message.time)
        .bind(message.deleted)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "group message"))?;

        Ok(row.into_message())
    }

    async fn find_by_id(&self, id: MessageId) -> Result<Option<GroupMessage>, AppError> {
        let row = sqlx::query_as::<_, GroupMessageRow>(
            r#"
            SELECT id, sender_id, group_id, content, time, deleted
            FROM group_messages
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(GroupMessageRow::into_message))
    }

    async fn page_before_time(
        &self,
        group_id: GroupId,
        before: i64,
        limit: usize,
    ) -> Result<Page<GroupMessage>, AppError> {
        let rows = sqlx::query_as::<_, GroupMessageRow>(
            r#"
            SELECT id, sender_id, group_id, content, time, deleted
            FROM group_messages
            WHERE group_id = $1 AND time < $2 AND NOT deleted
            ORDER BY time DESC
            LIMIT $3
            "#,
        )
        .bind(group_id.0)
        .bind(before)
        .bind(overfetch(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::from_overfetch(
            rows.into_iter().map(GroupMessageRow::into_message).collect(),
            limit,
        ))
    }
}
