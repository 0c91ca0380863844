//! Presence Service
//!
//! Connection lifecycle hooks and explicit status changes. After every change
//! the user's aggregate presence is recomputed and, if it differs from what
//! was last announced, broadcast to everyone else.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::events::SessionRef;
use crate::domain::{
    PresenceStatus, ServerEvent, SessionId, SessionTransport, Status, UserId,
};
use crate::infrastructure::cache::UserDirectory;
use crate::infrastructure::metrics;
use crate::infrastructure::realtime::{Broadcaster, PresenceAggregator, SessionRegistry};
use crate::shared::error::AppError;

/// Presence service trait
#[async_trait]
pub trait PresenceService: Send + Sync {
    /// Register a new connection for `user_id`.
    async fn open(
        &self,
        user_id: UserId,
        session_id: SessionId,
        transport: Arc<dyn SessionTransport>,
    ) -> Result<(), PresenceError>;

    /// Connection closed by the client. Returns the owner if the session was live.
    async fn close(&self, session_id: SessionId) -> Option<UserId>;

    /// Connection failed. Same cleanup as [`PresenceService::close`].
    async fn error(&self, session_id: SessionId) -> Option<UserId>;

    /// Status reported by one of the user's sessions. Returns the aggregate.
    async fn set_status(
        &self,
        user_id: UserId,
        session_id: SessionId,
        status: Status,
    ) -> Result<Status, PresenceError>;

    /// Last announced aggregate status of `user_id`.
    fn current_status(&self, user_id: UserId) -> Status;

    /// Close every session of `user_id`. Returns how many were closed.
    async fn disconnect_user(&self, user_id: UserId, reason: &str) -> usize;
}

/// Presence service errors
#[derive(Debug, thiserror::Error)]
pub enum PresenceError {
    #[error("User not found")]
    UserNotFound,

    #[error("User is disabled")]
    UserDisabled,

    #[error("Session {0} is already registered")]
    DuplicateSession(SessionId),

    #[error("Session {0} belongs to another user")]
    ForeignSession(SessionId),

    #[error("Repository failure: {0}")]
    Repository(String),
}

impl From<PresenceError> for AppError {
    fn from(error: PresenceError) -> Self {
        match error {
            PresenceError::UserNotFound => AppError::NotFound(error.to_string()),
            PresenceError::UserDisabled | PresenceError::ForeignSession(_) => {
                AppError::Invalid(error.to_string())
            }
            PresenceError::DuplicateSession(_) => AppError::Conflict(error.to_string()),
            PresenceError::Repository(msg) => AppError::Repository(msg),
        }
    }
}

/// PresenceService implementation
pub struct PresenceServiceImpl {
    users: Arc<UserDirectory>,
    registry: Arc<SessionRegistry>,
    aggregator: Arc<PresenceAggregator>,
    broadcaster: Arc<Broadcaster>,
    /// Last aggregate announced per online user
    announced: DashMap<UserId, Status>,
}

impl PresenceServiceImpl {
    pub fn new(
        users: Arc<UserDirectory>,
        registry: Arc<SessionRegistry>,
        aggregator: Arc<PresenceAggregator>,
        broadcaster: Arc<Broadcaster>,
    ) -> Self {
        Self {
            users,
            registry,
            aggregator,
            broadcaster,
            announced: DashMap::new(),
        }
    }

    async fn ensure_enabled(&self, user_id: UserId) -> Result<(), PresenceError> {
        let user = self
            .users
            .get(user_id)
            .await
            .map_err(|e| PresenceError::Repository(e.to_string()))?
            .ok_or(PresenceError::UserNotFound)?;

        if !user.is_enabled() {
            return Err(PresenceError::UserDisabled);
        }
        Ok(())
    }

    /// Recompute the aggregate and announce it if it changed.
    fn refresh(&self, user_id: UserId) -> Status {
        // The announced entry is held while aggregating so concurrent
        // refreshes of one user apply in order.
        let (status, changed) = {
            let mut announced = self.announced.entry(user_id).or_insert(Status::Offline);
            let status = self
                .aggregator
                .aggregate(user_id)
                .map(|presence| presence.status)
                .unwrap_or(Status::Offline);
            let changed = *announced != status;
            *announced = status;
            (status, changed)
        };
        if status == Status::Offline {
            self.announced.remove_if(&user_id, |_, s| *s == Status::Offline);
        }

        if changed {
            tracing::info!(user_id = %user_id, status = %status, "Presence changed");
            metrics::record_presence_change(status.as_str());
            self.broadcaster
                .send_to_all_except(user_id, &ServerEvent::user_status(user_id, status));
        }
        status
    }

    fn terminate(&self, session_id: SessionId, transport: &dyn SessionTransport, reason: &str) {
        if let Err(e) = transport.send(&ServerEvent::close_session(reason)) {
            tracing::debug!(session_id = %session_id, error = %e, "Close notice not delivered");
        }
        transport.close();
    }

    fn cleanup(&self, session_id: SessionId) -> Option<UserId> {
        let user_id = self.registry.remove_session(session_id)?;
        self.refresh(user_id);
        Some(user_id)
    }
}

#[async_trait]
impl PresenceService for PresenceServiceImpl {
    async fn open(
        &self,
        user_id: UserId,
        session_id: SessionId,
        transport: Arc<dyn SessionTransport>,
    ) -> Result<(), PresenceError> {
        self.ensure_enabled(user_id).await?;

        self.registry
            .add_session(user_id, session_id, transport)
            .map_err(|_| PresenceError::DuplicateSession(session_id))?;

        self.broadcaster.send_to_session(
            session_id,
            &ServerEvent::EstablishedSession(SessionRef { session_id }),
        );
        self.refresh(user_id);
        Ok(())
    }

    async fn close(&self, session_id: SessionId) -> Option<UserId> {
        let owner = self.cleanup(session_id);
        if owner.is_none() {
            tracing::debug!(session_id = %session_id, "Session already closed");
        }
        owner
    }

    async fn error(&self, session_id: SessionId) -> Option<UserId> {
        tracing::warn!(session_id = %session_id, "Session transport error");
        self.cleanup(session_id)
    }

    async fn set_status(
        &self,
        user_id: UserId,
        session_id: SessionId,
        status: Status,
    ) -> Result<Status, PresenceError> {
        self.ensure_enabled(user_id).await?;
        if let Some(owner) = self.registry.user_of(session_id) {
            if owner != user_id {
                return Err(PresenceError::ForeignSession(session_id));
            }
        }

        if status == Status::Offline {
            let transport = self.registry.transport(session_id);
            if self.registry.remove_session(session_id).is_some() {
                if let Some(transport) = transport {
                    self.terminate(session_id, transport.as_ref(), "offline");
                }
            }
        } else if !self
            .registry
            .update_status(session_id, PresenceStatus::now(status))
        {
            tracing::warn!(
                user_id = %user_id,
                session_id = %session_id,
                status = %status,
                "Status reported for a closed session, treating it as offline"
            );
        }

        Ok(self.refresh(user_id))
    }

    fn current_status(&self, user_id: UserId) -> Status {
        self.announced
            .get(&user_id)
            .map(|status| *status.value())
            .unwrap_or(Status::Offline)
    }

    async fn disconnect_user(&self, user_id: UserId, reason: &str) -> usize {
        let removed = self.registry.remove_user_sessions(user_id);
        for (session_id, transport) in &removed {
            self.terminate(*session_id, transport.as_ref(), reason);
        }
        self.refresh(user_id);
        removed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{User, UserRepository};
    use crate::infrastructure::realtime::registry::tests::RecordingTransport;
    use crate::infrastructure::repositories::InMemoryUserRepository;

    struct Fixture {
        service: PresenceServiceImpl,
        registry: Arc<SessionRegistry>,
        repo: Arc<InMemoryUserRepository>,
    }

    fn fixture() -> Fixture {
        let repo = Arc::new(InMemoryUserRepository::new());
        let users = Arc::new(UserDirectory::new(repo.clone()));
        let registry = Arc::new(SessionRegistry::new());
        let aggregator = Arc::new(PresenceAggregator::new(registry.clone()));
        let broadcaster = Arc::new(Broadcaster::new(registry.clone()));
        Fixture {
            service: PresenceServiceImpl::new(users, registry.clone(), aggregator, broadcaster),
            registry,
            repo,
        }
    }

    async fn user(fixture: &Fixture, name: &str) -> UserId {
        fixture.repo.insert(&User::new(name, name)).await.unwrap().id
    }

    #[tokio::test]
    async fn test_open_sends_established_session_and_announces() {
        let f = fixture();
        let alice = user(&f, "alice").await;
        let bob = user(&f, "bob").await;
        let bob_tab = RecordingTransport::new();
        f.service.open(bob, SessionId::new(), bob_tab.clone()).await.unwrap();

        let alice_tab = RecordingTransport::new();
        f.service
            .open(alice, SessionId::new(), alice_tab.clone())
            .await
            .unwrap();

        assert_eq!(alice_tab.categories(), vec!["newsession"]);
        assert_eq!(bob_tab.categories(), vec!["newsession", "ustatus"]);
        assert_eq!(f.service.current_status(alice), Status::ConnectionInProgress);
    }

    #[tokio::test]
    async fn test_open_unknown_user() {
        let f = fixture();
        let result = f
            .service
            .open(UserId::new(), SessionId::new(), RecordingTransport::new())
            .await;
        assert!(matches!(result, Err(PresenceError::UserNotFound)));
        assert_eq!(f.registry.session_count(), 0);
    }

    #[tokio::test]
    async fn test_open_duplicate_session() {
        let f = fixture();
        let alice = user(&f, "alice").await;
        let session = SessionId::new();
        f.service.open(alice, session, RecordingTransport::new()).await.unwrap();

        let result = f.service.open(alice, session, RecordingTransport::new()).await;

        assert!(matches!(result, Err(PresenceError::DuplicateSession(_))));
    }

    #[tokio::test]
    async fn test_close_and_error_clean_up_exactly_once() {
        let f = fixture();
        let alice = user(&f, "alice").await;
        let session = SessionId::new();
        f.service.open(alice, session, RecordingTransport::new()).await.unwrap();

        assert_eq!(f.service.close(session).await, Some(alice));
        assert_eq!(f.service.error(session).await, None);
        assert_eq!(f.service.current_status(alice), Status::Offline);
    }

    #[tokio::test]
    async fn test_set_status_aggregates_across_sessions() {
        let f = fixture();
        let alice = user(&f, "alice").await;
        let laptop = SessionId::new();
        let desktop = SessionId::new();
        f.service.open(alice, laptop, RecordingTransport::new()).await.unwrap();
        f.service.open(alice, desktop, RecordingTransport::new()).await.unwrap();

        f.service.set_status(alice, laptop, Status::Busy).await.unwrap();
        let aggregate = f
            .service
            .set_status(alice, desktop, Status::ComputerLocked)
            .await
            .unwrap();

        assert_eq!(aggregate, Status::Busy);
    }

    #[tokio::test]
    async fn test_offline_report_closes_only_that_session() {
        let f = fixture();
        let alice = user(&f, "alice").await;
        let phone = SessionId::new();
        let phone_tab = RecordingTransport::new();
        let desktop = SessionId::new();
        f.service.open(alice, phone, phone_tab.clone()).await.unwrap();
        f.service.open(alice, desktop, RecordingTransport::new()).await.unwrap();
        f.service.set_status(alice, desktop, Status::Away).await.unwrap();

        let aggregate = f.service.set_status(alice, phone, Status::Offline).await.unwrap();

        assert_eq!(aggregate, Status::Away);
        assert!(phone_tab.is_closed());
        assert!(phone_tab.categories().contains(&"delsession"));
        assert_eq!(f.registry.sessions_for(alice), vec![desktop]);
    }

    #[tokio::test]
    async fn test_status_for_closed_session_falls_back_to_offline() {
        let f = fixture();
        let alice = user(&f, "alice").await;

        let aggregate = f
            .service
            .set_status(alice, SessionId::new(), Status::Available)
            .await
            .unwrap();

        assert_eq!(aggregate, Status::Offline);
    }

    #[tokio::test]
    async fn test_unchanged_aggregate_is_not_rebroadcast() {
        let f = fixture();
        let alice = user(&f, "alice").await;
        let bob = user(&f, "bob").await;
        let bob_tab = RecordingTransport::new();
        f.service.open(bob, SessionId::new(), bob_tab.clone()).await.unwrap();
        let a1 = SessionId::new();
        let a2 = SessionId::new();
        f.service.open(alice, a1, RecordingTransport::new()).await.unwrap();
        f.service.open(alice, a2, RecordingTransport::new()).await.unwrap();
        f.service.set_status(alice, a1, Status::Busy).await.unwrap();
        let before = bob_tab.categories().len();

        // ComputerLocked does not change a Busy aggregate
        f.service.set_status(alice, a2, Status::ComputerLocked).await.unwrap();

        assert_eq!(bob_tab.categories().len(), before);
    }

    #[tokio::test]
    async fn test_foreign_session_is_rejected() {
        let f = fixture();
        let alice = user(&f, "alice").await;
        let bob = user(&f, "bob").await;
        let bob_session = SessionId::new();
        f.service.open(bob, bob_session, RecordingTransport::new()).await.unwrap();

        let result = f.service.set_status(alice, bob_session, Status::Busy).await;

        assert!(matches!(result, Err(PresenceError::ForeignSession(_))));
    }

    #[tokio::test]
    async fn test_disconnect_user_closes_every_session() {
        let f = fixture();
        let alice = user(&f, "alice").await;
        let t1 = RecordingTransport::new();
        let t2 = RecordingTransport::new();
        f.service.open(alice, SessionId::new(), t1.clone()).await.unwrap();
        f.service.open(alice, SessionId::new(), t2.clone()).await.unwrap();

        assert_eq!(f.service.disconnect_user(alice, "account disabled").await, 2);
        assert!(t1.is_closed() && t2.is_closed());
        assert_eq!(f.service.current_status(alice), Status::Offline);
    }
}
