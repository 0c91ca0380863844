//! Presence Aggregator
//!
//! Derives one authoritative status per user from all of that user's live
//! sessions. The most recent report wins, except that ComputerLocked only
//! wins when nothing else is reported.

use std::sync::Arc;

use crate::domain::{PresenceStatus, SessionTransport, UserId};

use super::registry::SessionRegistry;

pub struct PresenceAggregator {
    registry: Arc<SessionRegistry>,
}

impl PresenceAggregator {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// Aggregate status of `user_id`, or `None` when the user is offline.
    ///
    /// Runs under the registry's write lock. Reverse-index entries whose
    /// session is gone are repaired with a warning. When the winner is
    /// Offline, or no session is left, every residual session of the user is
    /// purged and its transport closed after the lock is released.
    pub fn aggregate(&self, user_id: UserId) -> Option<PresenceStatus> {
        let mut evicted: Vec<Arc<dyn SessionTransport>> = Vec::new();

        let winner = {
            let mut state = self.registry.write();

            let session_ids: Vec<_> = state
                .by_user
                .get(&user_id)
                .map(|set| set.iter().copied().collect())
                .unwrap_or_default();

            let mut winner: Option<PresenceStatus> = None;
            for session_id in session_ids {
                let status = match state.sessions.get(&session_id) {
                    Some(entry) if entry.user_id == user_id => entry.status,
                    _ => {
                        tracing::warn!(
                            user_id = %user_id,
                            session_id = %session_id,
                            "Repaired user index entry without a live session"
                        );
                        state.unlink(user_id, session_id);
                        continue;
                    }
                };
                // Strictly greater: the first session in id order keeps a tie
                if winner.map_or(true, |current| status.rank_key() > current.rank_key()) {
                    winner = Some(status);
                }
            }

            match winner {
                Some(status) if !status.is_offline() => Some(status),
                _ => {
                    if let Some(ids) = state.by_user.remove(&user_id) {
                        for session_id in ids {
                            if let Some(entry) = state.sessions.remove(&session_id) {
                                evicted.push(entry.transport);
                            }
                        }
                    }
                    None
                }
            }
        };

        if !evicted.is_empty() {
            tracing::info!(
                user_id = %user_id,
                count = evicted.len(),
                "User is offline, purged residual sessions"
            );
            crate::infrastructure::metrics::set_active_sessions(self.registry.session_count());
            for transport in evicted {
                transport.close();
            }
        }

        winner
    }
}
