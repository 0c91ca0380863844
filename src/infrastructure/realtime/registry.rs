//! Session Registry
//!
//! Bidirectional mapping between live connections and user identity, plus the
//! status each connection last reported. Both indices live behind a single
//! lock so that every add/remove is atomic with respect to every other.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockWriteGuard};

use crate::domain::{PresenceStatus, SessionId, SessionTransport, UserId};
use crate::infrastructure::metrics;
use crate::shared::error::AppError;

/// A registered session.
#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub user_id: UserId,
    pub transport: Arc<dyn SessionTransport>,
    pub status: PresenceStatus,
}

/// A transport handle captured for delivery after the lock is released.
pub type TransportHandle = (SessionId, Arc<dyn SessionTransport>);

#[derive(Debug, Default)]
pub(crate) struct RegistryState {
    /// Forward index: session -> owner and status
    pub(crate) sessions: HashMap<SessionId, SessionEntry>,
    /// Reverse index: user -> sessions, ordered for deterministic iteration
    pub(crate) by_user: HashMap<UserId, BTreeSet<SessionId>>,
}

impl RegistryState {
    /// Remove `session_id` from the reverse index of `user_id`, dropping the
    /// user entirely once no session is left.
    pub(crate) fn unlink(&mut self, user_id: UserId, session_id: SessionId) -> bool {
        let Some(set) = self.by_user.get_mut(&user_id) else {
            return false;
        };
        let removed = set.remove(&session_id);
        if set.is_empty() {
            self.by_user.remove(&user_id);
        }
        removed
    }
}

/// Registry of live sessions.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    state: RwLock<RegistryState>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `session_id` for `user_id` with the initial "connecting" status.
    ///
    /// # Errors
    ///
    /// `Conflict` if the same session id is already registered.
    pub fn add_session(
        &self,
        user_id: UserId,
        session_id: SessionId,
        transport: Arc<dyn SessionTransport>,
    ) -> Result<(), AppError> {
        let count = {
            let mut state = self.state.write();
            if state.sessions.contains_key(&session_id) {
                return Err(AppError::Conflict(format!(
                    "Session {} is already registered",
                    session_id
                )));
            }
            state.sessions.insert(
                session_id,
                SessionEntry {
                    user_id,
                    transport,
                    status: PresenceStatus::connecting(),
                },
            );
            state.by_user.entry(user_id).or_default().insert(session_id);
            state.sessions.len()
        };

        metrics::set_active_sessions(count);
        tracing::info!(user_id = %user_id, session_id = %session_id, "Session registered");
        Ok(())
    }

    /// Remove a session from every index. Idempotent.
    ///
    /// Returns the owning user, or `None` if the session was not registered.
    /// A reverse-index entry left behind without its forward entry is removed
    /// as well.
    pub fn remove_session(&self, session_id: SessionId) -> Option<UserId> {
        let (owner, count) = {
            let mut state = self.state.write();
            let owner = match state.sessions.remove(&session_id) {
                Some(entry) => {
                    if !state.unlink(entry.user_id, session_id) {
                        tracing::warn!(
                            user_id = %entry.user_id,
                            session_id = %session_id,
                            "Session was missing from the user index"
                        );
                    }
                    Some(entry.user_id)
                }
                None => {
                    let dangling: Vec<UserId> = state
                        .by_user
                        .iter()
                        .filter(|(_, set)| set.contains(&session_id))
                        .map(|(user_id, _)| *user_id)
                        .collect();
                    for user_id in dangling {
                        tracing::warn!(
                            user_id = %user_id,
                            session_id = %session_id,
                            "Removed dangling user index entry"
                        );
                        state.unlink(user_id, session_id);
                    }
                    None
                }
            };
            (owner, state.sessions.len())
        };

        if let Some(user_id) = owner {
            metrics::set_active_sessions(count);
            tracing::info!(user_id = %user_id, session_id = %session_id, "Session removed");
        }
        owner
    }

    /// Record a status reported by `session_id`.
    ///
    /// Returns `false` when the session is not registered (already closed).
    pub fn update_status(&self, session_id: SessionId, status: PresenceStatus) -> bool {
        let mut state = self.state.write();
        match state.sessions.get_mut(&session_id) {
            Some(entry) => {
                entry.status = status;
                true
            }
            None => false,
        }
    }

    /// Point-in-time snapshot of a user's sessions.
    pub fn sessions_for(&self, user_id: UserId) -> Vec<SessionId> {
        self.state
            .read()
            .by_user
            .get(&user_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn user_of(&self, session_id: SessionId) -> Option<UserId> {
        self.state
            .read()
            .sessions
            .get(&session_id)
            .map(|entry| entry.user_id)
    }

    pub fn status_of(&self, session_id: SessionId) -> Option<PresenceStatus> {
        self.state
            .read()
            .sessions
            .get(&session_id)
            .map(|entry| entry.status)
    }

    pub fn is_online(&self, user_id: UserId) -> bool {
        self.state.read().by_user.contains_key(&user_id)
    }

    pub fn transport(&self, session_id: SessionId) -> Option<Arc<dyn SessionTransport>> {
        self.state
            .read()
            .sessions
            .get(&session_id)
            .map(|entry| entry.transport.clone())
    }

    /// Transports of every session of the given users.
    pub fn transports_for(&self, user_ids: &[UserId]) -> Vec<TransportHandle> {
        let state = self.state.read();
        let mut handles = Vec::new();
        for user_id in user_ids {
            let Some(set) = state.by_user.get(user_id) else {
                continue;
            };
            handles.extend(set.iter().filter_map(|session_id| {
                state
                    .sessions
                    .get(session_id)
                    .map(|entry| (*session_id, entry.transport.clone()))
            }));
        }
        handles
    }

    /// Transports of every live session, optionally skipping one user's.
    pub fn all_transports(&self, except: Option<UserId>) -> Vec<TransportHandle> {
        self.state
            .read()
            .sessions
            .iter()
            .filter(|(_, entry)| Some(entry.user_id) != except)
            .map(|(session_id, entry)| (*session_id, entry.transport.clone()))
            .collect()
    }

    /// Remove every session of `user_id`, returning their transports.
    pub fn remove_user_sessions(&self, user_id: UserId) -> Vec<TransportHandle> {
        let (removed, count) = {
            let mut state = self.state.write();
            let ids = state.by_user.remove(&user_id).unwrap_or_default();
            let mut removed: Vec<TransportHandle> = ids
                .into_iter()
                .filter_map(|session_id| {
                    state
                        .sessions
                        .remove(&session_id)
                        .map(|entry| (session_id, entry.transport))
                })
                .collect();
            // Forward entries without a reverse entry
            let orphans: Vec<SessionId> = state
                .sessions
                .iter()
                .filter(|(_, entry)| entry.user_id == user_id)
                .map(|(session_id, _)| *session_id)
                .collect();
            for session_id in orphans {
                if let Some(entry) = state.sessions.remove(&session_id) {
                    tracing::warn!(
                        user_id = %user_id,
                        session_id = %session_id,
                        "Removed session missing from the user index"
                    );
                    removed.push((session_id, entry.transport));
                }
            }
            (removed, state.sessions.len())
        };

        metrics::set_active_sessions(count);
        if !removed.is_empty() {
            tracing::info!(user_id = %user_id, count = removed.len(), "User sessions removed");
        }
        removed
    }

    pub fn session_count(&self) -> usize {
        self.state.read().sessions.len()
    }

    pub fn online_user_count(&self) -> usize {
        self.state.read().by_user.len()
    }

    /// Exclusive access for multi-step operations that must observe and
    /// repair both indices atomically.
    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write()
    }
}
