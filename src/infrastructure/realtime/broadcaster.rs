//! Broadcaster
//!
//! Delivers outbound events to live sessions. Targets are resolved through the
//! session registry, the lock is released, and then every session is written
//! independently so one dead connection cannot stall or abort the others.

use std::sync::Arc;

use crate::domain::services::{NotificationSink, BROADCAST_ROUTING_KEY};
use crate::domain::{ServerEvent, SessionId, UserId};
use crate::infrastructure::metrics;

use super::registry::{SessionRegistry, TransportHandle};

/// Outcome of one broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    /// Sessions whose transport refused the event
    pub failed: Vec<SessionId>,
}

impl DeliveryReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct Broadcaster {
    registry: Arc<SessionRegistry>,
    sink: Option<Arc<dyn NotificationSink>>,
}

impl Broadcaster {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self {
            registry,
            sink: None,
        }
    }

    /// Mirror every event to a broker in addition to local sessions.
    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Deliver to one session only.
    pub fn send_to_session(&self, session_id: SessionId, event: &ServerEvent) -> bool {
        match self.registry.transport(session_id) {
            Some(transport) => self.deliver(vec![(session_id, transport)], event).is_complete(),
            None => {
                tracing::debug!(session_id = %session_id, "Session is gone, event dropped");
                false
            }
        }
    }

    /// Deliver to every session of `user_id`.
    pub fn send_to_user(&self, user_id: UserId, event: &ServerEvent) -> DeliveryReport {
        self.publish(&user_id.to_string(), event);
        self.deliver(self.registry.transports_for(&[user_id]), event)
    }

    /// Deliver to every session of each user in `user_ids`.
    pub fn send_to_users(&self, user_ids: &[UserId], event: &ServerEvent) -> DeliveryReport {
        for user_id in user_ids {
            self.publish(&user_id.to_string(), event);
        }
        self.deliver(self.registry.transports_for(user_ids), event)
    }

    /// Deliver to every live session.
    pub fn send_to_all(&self, event: &ServerEvent) -> DeliveryReport {
        self.publish(BROADCAST_ROUTING_KEY, event);
        self.deliver(self.registry.all_transports(None), event)
    }

    /// Deliver to every live session not owned by `initiator`.
    ///
    /// All of the initiator's sessions are skipped, not just the one that
    /// triggered the event.
    pub fn send_to_all_except(&self, initiator: UserId, event: &ServerEvent) -> DeliveryReport {
        self.publish(BROADCAST_ROUTING_KEY, event);
        self.deliver(self.registry.all_transports(Some(initiator)), event)
    }

    fn deliver(&self, targets: Vec<TransportHandle>, event: &ServerEvent) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        for (session_id, transport) in targets {
            match transport.send(event) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::warn!(
                        session_id = %session_id,
                        category = event.category(),
                        error = %e,
                        "Failed to deliver event"
                    );
                    report.failed.push(session_id);
                }
            }
        }

        metrics::record_delivery(event.category(), report.delivered, report.failed.len());
        report
    }

    fn publish(&self, routing_key: &str, event: &ServerEvent) {
        if let Some(sink) = &self.sink {
            sink.publish(routing_key, event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Status;
    use crate::infrastructure::realtime::registry::tests::RecordingTransport;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        published: Mutex<Vec<(String, &'static str)>>,
    }

    impl NotificationSink for RecordingSink {
        fn publish(&self, routing_key: &str, event: &ServerEvent) {
            self.published
                .lock()
                .push((routing_key.to_string(), event.category()));
        }
    }

    fn event() -> ServerEvent {
        ServerEvent::user_status(UserId::new(), Status::Away)
    }

    #[test]
    fn test_send_to_user_reaches_every_session() {
        let registry = Arc::new(SessionRegistry::new());
        let broadcaster = Broadcaster::new(registry.clone());
        let user = UserId::new();
        let t1 = RecordingTransport::new();
        let t2 = RecordingTransport::new();
        registry.add_session(user, SessionId::new(), t1.clone()).unwrap();
        registry.add_session(user, SessionId::new(), t2.clone()).unwrap();

        let report = broadcaster.send_to_user(user, &event());

        assert_eq!(report.delivered, 2);
        assert_eq!(t1.categories(), vec!["ustatus"]);
        assert_eq!(t2.categories(), vec!["ustatus"]);
    }

    #[test]
    fn test_failed_session_does_not_abort_delivery() {
        let registry = Arc::new(SessionRegistry::new());
        let broadcaster = Broadcaster::new(registry.clone());
        let dead = SessionId::new();
        let alive = RecordingTransport::new();
        registry
            .add_session(UserId::new(), dead, RecordingTransport::failing())
            .unwrap();
        registry
            .add_session(UserId::new(), SessionId::new(), alive.clone())
            .unwrap();

        let report = broadcaster.send_to_all(&event());

        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed, vec![dead]);
        assert_eq!(alive.categories().len(), 1);
    }

    #[test]
    fn test_send_to_all_except_skips_every_initiator_session() {
        let registry = Arc::new(SessionRegistry::new());
        let broadcaster = Broadcaster::new(registry.clone());
        let alice = UserId::new();
        let alice_tab1 = RecordingTransport::new();
        let alice_tab2 = RecordingTransport::new();
        let bob = RecordingTransport::new();
        registry.add_session(alice, SessionId::new(), alice_tab1.clone()).unwrap();
        registry.add_session(alice, SessionId::new(), alice_tab2.clone()).unwrap();
        registry.add_session(UserId::new(), SessionId::new(), bob.clone()).unwrap();

        let report = broadcaster.send_to_all_except(alice, &event());

        assert_eq!(report.delivered, 1);
        assert!(alice_tab1.categories().is_empty());
        assert!(alice_tab2.categories().is_empty());
        assert_eq!(bob.categories(), vec!["ustatus"]);
    }

    #[test]
    fn test_send_to_missing_session() {
        let broadcaster = Broadcaster::new(Arc::new(SessionRegistry::new()));
        assert!(!broadcaster.send_to_session(SessionId::new(), &event()));
    }

    #[test]
    fn test_sink_mirrors_events() {
        let registry = Arc::new(SessionRegistry::new());
        let sink = Arc::new(RecordingSink::default());
        let broadcaster = Broadcaster::new(registry).with_sink(sink.clone());
        let user = UserId::new();

        broadcaster.send_to_user(user, &event());
        broadcaster.send_to_all(&event());

        let published = sink.published.lock().clone();
        assert_eq!(
            published,
            vec![
                (user.to_string(), "ustatus"),
                (BROADCAST_ROUTING_KEY.to_string(), "ustatus"),
            ]
        );
    }
}
