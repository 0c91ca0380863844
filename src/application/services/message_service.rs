//! Message Service
//!
//! Direct and group messaging: validation, sequencing, persistence, unread
//! bookkeeping and delivery to every live session of the participants.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::LimitSettings;
use crate::domain::events::{GroupTypingPing, TypingPing};
use crate::domain::{
    ConversationKey, Group, GroupId, GroupMessage, GroupMessageRepository, Message, MessageId,
    MessageRepository, Page, ServerEvent, UserId,
};
use crate::infrastructure::cache::{GroupDirectory, MessageSequencer, UnreadTracker, UserDirectory};
use crate::infrastructure::metrics;
use crate::infrastructure::realtime::Broadcaster;
use crate::shared::error::AppError;

/// Message service trait
#[async_trait]
pub trait MessageService: Send + Sync {
    async fn send_direct(
        &self,
        from: UserId,
        to: UserId,
        content: &str,
    ) -> Result<Message, MessageError>;

    async fn send_group(
        &self,
        from: UserId,
        group_id: GroupId,
        content: &str,
    ) -> Result<GroupMessage, MessageError>;

    async fn get_message(&self, id: MessageId) -> Result<Message, MessageError>;

    async fn get_group_message(&self, id: MessageId) -> Result<GroupMessage, MessageError>;

    /// One page of the conversation between `user_id` and `other`, newest
    /// first, strictly older than `before` (`<= 0` means latest).
    async fn direct_conversation(
        &self,
        user_id: UserId,
        other: UserId,
        before: i64,
    ) -> Result<Page<Message>, MessageError>;

    async fn group_conversation(
        &self,
        user_id: UserId,
        group_id: GroupId,
        before: i64,
    ) -> Result<Page<GroupMessage>, MessageError>;

    async fn send_typing_to_user(&self, from: UserId, to: UserId) -> Result<(), MessageError>;

    async fn send_typing_to_group(&self, from: UserId, group_id: GroupId)
        -> Result<(), MessageError>;

    /// Unseen message count per sender.
    async fn unread_counts(&self, user_id: UserId) -> Result<HashMap<UserId, u64>, MessageError>;

    fn mark_seen(&self, user_id: UserId, sender: UserId) -> bool;

    fn mark_all_seen(&self, user_id: UserId) -> usize;
}

/// Message service errors
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("Message content is empty")]
    EmptyContent,

    #[error("Message content exceeds {0} characters")]
    ContentTooLong(usize),

    #[error("Cannot message yourself")]
    SelfAddressed,

    #[error("User {0} not found")]
    UserNotFound(UserId),

    #[error("User {0} is disabled")]
    UserDisabled(UserId),

    #[error("Group not found")]
    GroupNotFound,

    #[error("Group is disabled")]
    GroupDisabled,

    #[error("User is not a member of this group")]
    NotGroupMember,

    #[error("Message not found")]
    MessageNotFound,

    #[error("Repository failure: {0}")]
    Repository(String),
}

impl From<MessageError> for AppError {
    fn from(error: MessageError) -> Self {
        match error {
            MessageError::UserNotFound(_)
            | MessageError::GroupNotFound
            | MessageError::MessageNotFound => AppError::NotFound(error.to_string()),
            MessageError::Repository(msg) => AppError::Repository(msg),
            _ => AppError::Invalid(error.to_string()),
        }
    }
}

/// MessageService implementation
pub struct MessageServiceImpl {
    users: Arc<UserDirectory>,
    groups: Arc<GroupDirectory>,
    messages: Arc<dyn MessageRepository>,
    group_messages: Arc<dyn GroupMessageRepository>,
    sequencer: Arc<MessageSequencer>,
    unread: Arc<UnreadTracker>,
    broadcaster: Arc<Broadcaster>,
    limits: LimitSettings,
}

impl MessageServiceImpl {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        users: Arc<UserDirectory>,
        groups: Arc<GroupDirectory>,
        messages: Arc<dyn MessageRepository>,
        group_messages: Arc<dyn GroupMessageRepository>,
        sequencer: Arc<MessageSequencer>,
        unread: Arc<UnreadTracker>,
        broadcaster: Arc<Broadcaster>,
        limits: LimitSettings,
    ) -> Self {
        Self {
            users,
            groups,
            messages,
            group_messages,
            sequencer,
            unread,
            broadcaster,
            limits,
        }
    }

    fn validate_content(&self, content: &str) -> Result<(), MessageError> {
        if content.trim().is_empty() {
            return Err(MessageError::EmptyContent);
        }
        if content.chars().count() > self.limits.max_message_length {
            return Err(MessageError::ContentTooLong(self.limits.max_message_length));
        }
        Ok(())
    }

    async fn ensure_enabled(&self, user_id: UserId) -> Result<(), MessageError> {
        let user = self
            .users
            .get(user_id)
            .await
            .map_err(|e| MessageError::Repository(e.to_string()))?
            .ok_or(MessageError::UserNotFound(user_id))?;

        if !user.is_enabled() {
            return Err(MessageError::UserDisabled(user_id));
        }
        Ok(())
    }

    /// Group `group_id`, enabled and containing `member`.
    async fn member_group(&self, member: UserId, group_id: GroupId) -> Result<Group, MessageError> {
        let group = self
            .groups
            .get(group_id)
            .await
            .map_err(|e| MessageError::Repository(e.to_string()))?
            .ok_or(MessageError::GroupNotFound)?;

        if !group.enabled {
            return Err(MessageError::GroupDisabled);
        }
        if !group.has_member(member) {
            return Err(MessageError::NotGroupMember);
        }
        Ok(group)
    }

    fn page_cursor(before: i64) -> i64 {
        if before <= 0 {
            i64::MAX
        } else {
            before
        }
    }
}

#[async_trait]
impl MessageService for MessageServiceImpl {
    async fn send_direct(
        &self,
        from: UserId,
        to: UserId,
        content: &str,
    ) -> Result<Message, MessageError> {
        self.validate_content(content)?;
        if from == to {
            return Err(MessageError::SelfAddressed);
        }
        self.ensure_enabled(from).await?;
        self.ensure_enabled(to).await?;

        let mut message = Message::new(from, to, content);
        message.time = self.sequencer.next_timestamp(&message.conversation);

        let stored = self
            .messages
            .insert(&message)
            .await
            .map_err(|e| MessageError::Repository(e.to_string()))?;

        self.unread.record_incoming(to, from, stored.time);
        metrics::record_message_sent("direct");
        tracing::debug!(message_id = %stored.id, from = %from, to = %to, "Direct message stored");

        self.broadcaster
            .send_to_users(&[to, from], &ServerEvent::DirectMessage(stored.clone()));
        Ok(stored)
    }

    async fn send_group(
        &self,
        from: UserId,
        group_id: GroupId,
        content: &str,
    ) -> Result<GroupMessage, MessageError> {
        self.validate_content(content)?;
        self.ensure_enabled(from).await?;
        let group = self.member_group(from, group_id).await?;

        let mut message = GroupMessage::new(from, group_id, content);
        message.time = self.sequencer.next_timestamp(&message.conversation());

        let stored = self
            .group_messages
            .insert(&message)
            .await
            .map_err(|e| MessageError::Repository(e.to_string()))?;

        metrics::record_message_sent("group");
        tracing::debug!(message_id = %stored.id, group_id = %group_id, "Group message stored");

        let members: Vec<UserId> = group.user_ids.iter().copied().collect();
        self.broadcaster
            .send_to_users(&members, &ServerEvent::GroupMessage(stored.clone()));
        Ok(stored)
    }

    async fn get_message(&self, id: MessageId) -> Result<Message, MessageError> {
        self.messages
            .find_by_id(id)
            .await
            .map_err(|e| MessageError::Repository(e.to_string()))?
            .ok_or(MessageError::MessageNotFound)
    }

    async fn get_group_message(&self, id: MessageId) -> Result<GroupMessage, MessageError> {
        self.group_messages
            .find_by_id(id)
            .await
            .map_err(|e| MessageError::Repository(e.to_string()))?
            .ok_or(MessageError::MessageNotFound)
    }

    async fn direct_conversation(
        &self,
        user_id: UserId,
        other: UserId,
        before: i64,
    ) -> Result<Page<Message>, MessageError> {
        self.messages
            .page_before_time(
                &ConversationKey::direct(user_id, other),
                Self::page_cursor(before),
                self.limits.page_size,
            )
            .await
            .map_err(|e| MessageError::Repository(e.to_string()))
    }

    async fn group_conversation(
        &self,
        user_id: UserId,
        group_id: GroupId,
        before: i64,
    ) -> Result<Page<GroupMessage>, MessageError> {
        self.member_group(user_id, group_id).await?;

        self.group_messages
            .page_before_time(group_id, Self::page_cursor(before), self.limits.page_size)
            .await
            .map_err(|e| MessageError::Repository(e.to_string()))
    }

    async fn send_typing_to_user(&self, from: UserId, to: UserId) -> Result<(), MessageError> {
        if from == to {
            return Err(MessageError::SelfAddressed);
        }
        self.broadcaster
            .send_to_user(to, &ServerEvent::UserTypingPing(TypingPing { from }));
        Ok(())
    }

    async fn send_typing_to_group(
        &self,
        from: UserId,
        group_id: GroupId,
    ) -> Result<(), MessageError> {
        let group = self.member_group(from, group_id).await?;

        let others: Vec<UserId> = group
            .user_ids
            .iter()
            .copied()
            .filter(|member| *member != from)
            .collect();
        self.broadcaster.send_to_users(
            &others,
            &ServerEvent::GroupTypingPing(GroupTypingPing {
                group_id,
                user_id: from,
            }),
        );
        Ok(())
    }

    async fn unread_counts(&self, user_id: UserId) -> Result<HashMap<UserId, u64>, MessageError> {
        self.unread
            .unread_counts(user_id)
            .await
            .map_err(|e| MessageError::Repository(e.to_string()))
    }

    fn mark_seen(&self, user_id: UserId, sender: UserId) -> bool {
        self.unread.mark_seen(user_id, sender)
    }

    fn mark_all_seen(&self, user_id: UserId) -> usize {
        self.unread.mark_all_seen(user_id)
    }
}
