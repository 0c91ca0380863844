//! In-Memory Repositories
//!
//! Process-local implementations of every repository trait, used by the
//! `memory` storage backend and by the test suite. They enforce the same
//! uniqueness rules as the PostgreSQL schema.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;

use crate::domain::{
    ConversationKey, Group, GroupId, GroupMessage, GroupMessageRepository, GroupRepository,
    Message, MessageId, MessageRepository, Page, User, UserId, UserRepository,
};
use crate::shared::error::AppError;

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, AppError> {
        Ok(self.users.read().get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .read()
            .values()
            .find(|user| user.details.username == username)
            .cloned())
    }

    async fn find_all(&self) -> Result<Vec<User>, AppError> {
        let mut users: Vec<User> = self.users.read().values().cloned().collect();
        users.sort_by(|a, b| a.details.username.cmp(&b.details.username));
        Ok(users)
    }

    async fn insert(&self, user: &User) -> Result<User, AppError> {
        let mut users = self.users.write();
        if users.contains_key(&user.id)
            || users
                .values()
                .any(|other| other.details.username == user.details.username)
        {
            return Err(AppError::Conflict(format!(
                "Duplicate user: {}",
                user.details.username
            )));
        }
        users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn save(&self, user: &User) -> Result<User, AppError> {
        let mut users = self.users.write();
        if users
            .values()
            .any(|other| other.id != user.id && other.details.username == user.details.username)
        {
            return Err(AppError::Conflict(format!(
                "Duplicate user: {}",
                user.details.username
            )));
        }
        match users.get_mut(&user.id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(user.clone())
            }
            None => Err(AppError::NotFound(format!("User {} not found", user.id))),
        }
    }
}

#[derive(Default)]
pub struct InMemoryGroupRepository {
    groups: DashMap<GroupId, Group>,
}

impl InMemoryGroupRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GroupRepository for InMemoryGroupRepository {
    async fn find_by_id(&self, id: GroupId) -> Result<Option<Group>, AppError> {
        Ok(self.groups.get(&id).map(|group| group.value().clone()))
    }

    async fn insert(&self, group: &Group) -> Result<Group, AppError> {
        if self.groups.contains_key(&group.id) {
            return Err(AppError::Conflict(format!("Duplicate group: {}", group.id)));
        }
        self.groups.insert(group.id, group.clone());
        Ok(group.clone())
    }

    async fn save(&self, group: &Group) -> Result<Group, AppError> {
        match self.groups.get_mut(&group.id) {
            Some(mut stored) => {
                *stored = group.clone();
                Ok(group.clone())
            }
            None => Err(AppError::NotFound(format!("Group {} not found", group.id))),
        }
    }
}

/// Conversation streams ordered by time.
type Streams<K, M> = DashMap<K, BTreeMap<i64, M>>;

fn page_before<M: Clone>(
    stream: &BTreeMap<i64, M>,
    before: i64,
    limit: usize,
    deleted: impl Fn(&M) -> bool,
) -> Page<M> {
    let rows: Vec<M> = stream
        .range(..before)
        .rev()
        .map(|(_, message)| message)
        .filter(|message| !deleted(*message))
        .take(limit.saturating_add(1))
        .cloned()
        .collect();
    Page::from_overfetch(rows, limit)
}

#[derive(Default)]
pub struct InMemoryMessageRepository {
    streams: Streams<ConversationKey, Message>,
    index: DashMap<MessageId, (ConversationKey, i64)>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn insert(&self, message: &Message) -> Result<Message, AppError> {
        let mut stream = self.streams.entry(message.conversation.clone()).or_default();
        if stream.contains_key(&message.time) {
            return Err(AppError::Conflict(format!(
                "Duplicate message time {} in {}",
                message.time, message.conversation
            )));
        }
        stream.insert(message.time, message.clone());
        self.index
            .insert(message.id, (message.conversation.clone(), message.time));
        Ok(message.clone())
    }

    async fn find_by_id(&self, id: MessageId) -> Result<Option<Message>, AppError> {
        let Some(location) = self.index.get(&id).map(|entry| entry.value().clone()) else {
            return Ok(None);
        };
        let (conversation, time) = location;
        Ok(self
            .streams
            .get(&conversation)
            .and_then(|stream| stream.get(&time).cloned()))
    }

    async fn page_before_time(
        &self,
        conversation: &ConversationKey,
        before: i64,
        limit: usize,
    ) -> Result<Page<Message>, AppError> {
        Ok(self
            .streams
            .get(conversation)
            .map(|stream| page_before(stream.value(), before, limit, |m: &Message| m.deleted))
            .unwrap_or_else(Page::empty))
    }

    async fn count_after_time(
        &self,
        conversation: &ConversationKey,
        after: i64,
    ) -> Result<u64, AppError> {
        Ok(self
            .streams
            .get(conversation)
            .map(|stream| {
                stream
                    .range(after..)
                    .filter(|(_, message)| !message.deleted)
                    .count() as u64
            })
            .unwrap_or(0))
    }
}

#[derive(Default)]
pub struct InMemoryGroupMessageRepository {
    streams: Streams<GroupId, GroupMessage>,
    index: DashMap<MessageId, (GroupId, i64)>,
}

impl InMemoryGroupMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GroupMessageRepository for InMemoryGroupMessageRepository {
    async fn insert(&self, message: &GroupMessage) -> Result<GroupMessage, AppError> {
        let mut stream = self.streams.entry(message.group_id).or_default();
        if stream.contains_key(&message.time) {
            return Err(AppError::Conflict(format!(
                "Duplicate message time {} in group {}",
                message.time, message.group_id
            )));
        }
        stream.insert(message.time, message.clone());
        self.index
            .insert(message.id, (message.group_id, message.time));
        Ok(message.clone())
    }

    async fn find_by_id(&self, id: MessageId) -> Result<Option<GroupMessage>, AppError> {
        let Some((group_id, time)) = self.index.get(&id).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        Ok(self
            .streams
            .get(&group_id)
            .and_then(|stream| stream.get(&time).cloned()))
    }

    async fn page_before_time(
        &self,
        group_id: GroupId,
        before: i64,
        limit: usize,
    ) -> Result<Page<GroupMessage>, AppError> {
        Ok(self
            .streams
            .get(&group_id)
            .map(|stream| page_before(stream.value(), before, limit, |m: &GroupMessage| m.deleted))
            .unwrap_or_else(Page::empty))
    }
}
