//! Message entities and repository traits.
//!
//! Maps to the `messages` and `group_messages` tables. The ordering key of a
//! conversation is `(conversation_key, time)` and is unique.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{ConversationKey, GroupId, MessageId, UserId};
use crate::shared::error::AppError;

/// A two-party message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub from: UserId,
    pub to: UserId,
    pub conversation: ConversationKey,
    pub content: String,
    /// Sequencer-issued timestamp (Unix millis, unique per conversation)
    pub time: i64,
    pub deleted: bool,
}

impl Message {
    /// Unstamped message; `time` is assigned by the sequencer before insert.
    pub fn new(from: UserId, to: UserId, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            from,
            to,
            conversation: ConversationKey::direct(from, to),
            content: content.into(),
            time: 0,
            deleted: false,
        }
    }
}

/// A message posted to a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMessage {
    pub id: MessageId,
    pub from: UserId,
    pub group_id: GroupId,
    pub content: String,
    pub time: i64,
    pub deleted: bool,
}

impl GroupMessage {
    pub fn new(from: UserId, group_id: GroupId, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            from,
            group_id,
            content: content.into(),
            time: 0,
            deleted: false,
        }
    }

    pub fn conversation(&self) -> ConversationKey {
        ConversationKey::group(self.group_id)
    }
}

/// One page of a conversation, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Older messages exist beyond this page
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            has_more: false,
        }
    }

    /// Build a page from up to `limit + 1` rows fetched newest first.
    pub fn from_overfetch(mut rows: Vec<T>, limit: usize) -> Self {
        let has_more = rows.len() > limit;
        rows.truncate(limit);
        Self {
            items: rows,
            has_more,
        }
    }
}

/// Repository trait for direct messages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Store a stamped message. Fails with `Conflict` if `(conversation, time)` is taken.
    async fn insert(&self, message: &Message) -> Result<Message, AppError>;

    async fn find_by_id(&self, id: MessageId) -> Result<Option<Message>, AppError>;

    /// Messages with `time < before`, newest first, deleted ones excluded.
    async fn page_before_time(
        &self,
        conversation: &ConversationKey,
        before: i64,
        limit: usize,
    ) -> Result<Page<Message>, AppError>;

    /// Number of non-deleted messages with `time >= after`.
    async fn count_after_time(
        &self,
        conversation: &ConversationKey,
        after: i64,
    ) -> Result<u64, AppError>;
}

/// Repository trait for group messages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GroupMessageRepository: Send + Sync {
    async fn insert(&self, message: &GroupMessage) -> Result<GroupMessage, AppError>;

    async fn find_by_id(&self, id: MessageId) -> Result<Option<GroupMessage>, AppError>;

    async fn page_before_time(
        &self,
        group_id: GroupId,
        before: i64,
        limit: usize,
    ) -> Result<Page<GroupMessage>, AppError>;
}
