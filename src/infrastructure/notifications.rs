//! Redis pub/sub notification backend.
//!
//! Mirrors outbound events to `"{prefix}.{routing_key}"` channels so that
//! other processes can observe them. Publishing never blocks the caller and
//! failures are only logged.

use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::domain::services::NotificationSink;
use crate::domain::ServerEvent;

#[derive(Clone)]
pub struct RedisNotificationSink {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisNotificationSink {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        Self {
            conn,
            prefix: prefix.into(),
        }
    }

    pub fn channel_for(prefix: &str, routing_key: &str) -> String {
        format!("{}.{}", prefix, routing_key)
    }
}

impl NotificationSink for RedisNotificationSink {
    fn publish(&self, routing_key: &str, event: &ServerEvent) {
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, category = event.category(), "Failed to encode event");
                return;
            }
        };
        let channel = Self::channel_for(&self.prefix, routing_key);

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(channel = %channel, "No runtime available, notification dropped");
            return;
        };

        let mut conn = self.conn.clone();
        runtime.spawn(async move {
            if let Err(e) = conn.publish::<_, _, ()>(&channel, payload).await {
                tracing::warn!(channel = %channel, error = %e, "Failed to publish notification");
            }
        });
    }
}
