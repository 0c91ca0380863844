//! Unread Tracker
//!
//! Per-recipient map of senders with unseen messages and the time the oldest
//! unseen message arrived. Only the cursor is cached; counts are always read
//! from the message store so they stay accurate without invalidation.
//!
//! Entries are sharded by recipient, so operations on different recipients
//! never contend.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;

use crate::domain::{ConversationKey, MessageRepository, UserId};
use crate::infrastructure::metrics;
use crate::shared::error::AppError;

pub struct UnreadTracker {
    /// recipient -> (sender -> first unseen time)
    entries: DashMap<UserId, HashMap<UserId, i64>>,
    messages: Arc<dyn MessageRepository>,
}

impl UnreadTracker {
    pub fn new(messages: Arc<dyn MessageRepository>) -> Self {
        Self {
            entries: DashMap::new(),
            messages,
        }
    }

    /// Record a message from `sender` to `recipient` stamped `time`.
    ///
    /// The cursor is only set if no entry exists yet. Sending is also treated
    /// as the sender having read everything `recipient` sent them.
    pub fn record_incoming(&self, recipient: UserId, sender: UserId, time: i64) {
        self.entries
            .entry(recipient)
            .or_default()
            .entry(sender)
            .or_insert(time);

        self.mark_seen(sender, recipient);
    }

    /// Clear the entry for (`recipient`, `sender`). Returns whether one existed.
    pub fn mark_seen(&self, recipient: UserId, sender: UserId) -> bool {
        let removed = match self.entries.get_mut(&recipient) {
            Some(mut senders) => senders.remove(&sender).is_some(),
            None => return false,
        };
        self.entries
            .remove_if(&recipient, |_, senders| senders.is_empty());
        removed
    }

    /// Clear every entry of `recipient`. Returns how many were cleared.
    pub fn mark_all_seen(&self, recipient: UserId) -> usize {
        self.entries
            .remove(&recipient)
            .map(|(_, senders)| senders.len())
            .unwrap_or(0)
    }

    /// First unseen time of `sender`'s messages to `recipient`.
    pub fn cursor(&self, recipient: UserId, sender: UserId) -> Option<i64> {
        self.entries
            .get(&recipient)
            .and_then(|senders| senders.get(&sender).copied())
    }

    /// Snapshot of all entries of `recipient`.
    pub fn entries(&self, recipient: UserId) -> HashMap<UserId, i64> {
        self.entries
            .get(&recipient)
            .map(|senders| senders.value().clone())
            .unwrap_or_default()
    }

    /// Unread message count per sender for `recipient`.
    ///
    /// An entry whose conversation holds no message at or after its cursor
    /// contradicts the entry's meaning; it is dropped with a warning and left
    /// out of the result.
    ///
    /// # Errors
    ///
    /// Store failures are surfaced unchanged.
    pub async fn unread_counts(&self, recipient: UserId) -> Result<HashMap<UserId, u64>, AppError> {
        // Snapshot first: no shard lock is held across the store calls
        let snapshot = self.entries(recipient);
        let mut counts = HashMap::with_capacity(snapshot.len());

        for (sender, since) in snapshot {
            let conversation = ConversationKey::direct(recipient, sender);
            let count = self.messages.count_after_time(&conversation, since).await?;

            if count == 0 {
                tracing::warn!(
                    recipient = %recipient,
                    sender = %sender,
                    since,
                    "Unread entry has no backing messages, dropping it"
                );
                self.drop_if_unchanged(recipient, sender, since);
                metrics::record_unread_entry_dropped();
                continue;
            }
            counts.insert(sender, count);
        }

        Ok(counts)
    }

    /// Remove the entry only if it still carries `since`; a fresh entry
    /// created meanwhile is kept.
    fn drop_if_unchanged(&self, recipient: UserId, sender: UserId, since: i64) {
        if let Some(mut senders) = self.entries.get_mut(&recipient) {
            if senders.get(&sender) == Some(&since) {
                senders.remove(&sender);
            }
        }
        self.entries
            .remove_if(&recipient, |_, senders| senders.is_empty());
    }
}
