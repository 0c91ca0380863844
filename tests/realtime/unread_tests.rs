//! Unread Tracking Tests

use std::collections::HashMap;
use std::sync::Arc;

use pretty_assertions::assert_eq;

use messenger_server::domain::{Message, MessageRepository, UserId};
use messenger_server::infrastructure::cache::UnreadTracker;
use messenger_server::infrastructure::repositories::InMemoryMessageRepository;

use crate::common::TestApp;

async fn store(repo: &InMemoryMessageRepository, from: UserId, to: UserId, time: i64) -> Message {
    let mut message = Message::new(from, to, format!("at {}", time));
    message.time = time;
    repo.insert(&message).await.unwrap()
}

#[tokio::test]
async fn test_cursor_pins_to_oldest_unseen_message() {
    let repo = Arc::new(InMemoryMessageRepository::new());
    let tracker = UnreadTracker::new(repo.clone());
    let x = UserId::new();
    let y = UserId::new();

    for time in [10, 20] {
        store(&repo, x, y, time).await;
        tracker.record_incoming(y, x, time);
    }
    assert_eq!(tracker.cursor(y, x), Some(10));
    assert_eq!(tracker.unread_counts(y).await.unwrap(), HashMap::from([(x, 2)]));

    assert!(tracker.mark_seen(y, x));
    assert!(tracker.unread_counts(y).await.unwrap().is_empty());

    store(&repo, x, y, 30).await;
    tracker.record_incoming(y, x, 30);
    assert_eq!(tracker.cursor(y, x), Some(30));
    assert_eq!(tracker.unread_counts(y).await.unwrap(), HashMap::from([(x, 1)]));
}

#[tokio::test]
async fn test_sending_does_not_clear_recipients_entry() {
    let app = TestApp::new();
    let a = app.create_user("anna").await;
    let b = app.create_user("ben").await;
    let messages = &app.state.messages;

    messages.send_direct(a, b, "first").await.unwrap();
    messages.send_direct(a, b, "second").await.unwrap();

    assert_eq!(messages.unread_counts(b).await.unwrap(), HashMap::from([(a, 2)]));
}

#[tokio::test]
async fn test_reply_clears_the_replier_entry() {
    let app = TestApp::new();
    let a = app.create_user("anna").await;
    let b = app.create_user("ben").await;
    let messages = &app.state.messages;

    messages.send_direct(a, b, "question").await.unwrap();
    messages.send_direct(b, a, "answer").await.unwrap();

    assert!(messages.unread_counts(b).await.unwrap().is_empty());
    assert_eq!(messages.unread_counts(a).await.unwrap(), HashMap::from([(b, 1)]));
}

#[tokio::test]
async fn test_mark_seen_twice_equals_once() {
    let app = TestApp::new();
    let a = app.create_user("anna").await;
    let b = app.create_user("ben").await;
    let messages = &app.state.messages;
    messages.send_direct(a, b, "hello").await.unwrap();

    messages.mark_seen(b, a);
    let after_once = messages.unread_counts(b).await.unwrap();
    messages.mark_seen(b, a);
    let after_twice = messages.unread_counts(b).await.unwrap();

    assert_eq!(after_once, after_twice);
    assert!(after_twice.is_empty());
}
