//! Message Sequencing Tests

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use messenger_server::domain::{ConversationKey, UserId};
use messenger_server::infrastructure::cache::MessageSequencer;

use crate::common::TestApp;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sends_get_distinct_times() {
    let app = TestApp::new();
    let a = app.create_user("anna").await;
    let b = app.create_user("ben").await;

    let mut handles = Vec::new();
    for i in 0..50 {
        let messages = app.state.messages.clone();
        let (from, to) = if i % 2 == 0 { (a, b) } else { (b, a) };
        handles.push(tokio::spawn(async move {
            messages
                .send_direct(from, to, &format!("message {}", i))
                .await
                .unwrap()
                .time
        }));
    }

    let mut times = HashSet::new();
    for handle in handles {
        assert!(times.insert(handle.await.unwrap()), "duplicate message time");
    }
    assert_eq!(times.len(), 50);
}

#[test]
fn test_sequencer_threads_never_collide() {
    let sequencer = Arc::new(MessageSequencer::new(Duration::from_secs(60), 1_000));
    let key = ConversationKey::direct(UserId::new(), UserId::new());

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let sequencer = sequencer.clone();
            let key = key.clone();
            std::thread::spawn(move || {
                (0..500)
                    .map(|_| sequencer.next_timestamp_at(&key, 1_000))
                    .collect::<Vec<i64>>()
            })
        })
        .collect();

    let mut all: Vec<i64> = workers
        .into_iter()
        .flat_map(|worker| worker.join().unwrap())
        .collect();
    all.sort_unstable();
    all.dedup();

    assert_eq!(all.len(), 8 * 500);
    assert_eq!(all.first(), Some(&1_000));
    assert_eq!(all.last(), Some(&(1_000 + 8 * 500 - 1)));
}
