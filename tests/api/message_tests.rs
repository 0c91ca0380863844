//! Message API Tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::TestApp;

#[tokio::test]
async fn test_send_and_fetch_direct_message() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;

    let (status, sent) = app
        .post_json(
            "/api/v1/messages",
            json!({ "from": alice, "to": bob, "content": "hello bob" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(sent["time"].as_i64().unwrap() > 0);

    let (status, fetched) = app
        .get(&format!("/api/v1/messages/{}", sent["id"].as_str().unwrap()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, sent);
}

#[tokio::test]
async fn test_message_to_self_is_rejected() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;

    let (status, body) = app
        .post_json(
            "/api/v1/messages",
            json!({ "from": alice, "to": alice, "content": "note to self" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 10002);
}

#[tokio::test]
async fn test_message_to_unknown_user_is_not_found() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;

    let (status, _) = app
        .post_json(
            "/api/v1/messages",
            json!({ "from": alice, "to": uuid::Uuid::new_v4(), "content": "anyone?" }),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_conversation_paging() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let mut times = Vec::new();
    for i in 0..3 {
        let (_, sent) = app
            .post_json(
                "/api/v1/messages",
                json!({ "from": alice, "to": bob, "content": format!("m{}", i) }),
            )
            .await;
        times.push(sent["time"].as_i64().unwrap());
    }

    let (status, page) = app
        .get(&format!("/api/v1/users/{}/conversations/{}", bob, alice))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["items"][0]["content"], "m2");
    assert_eq!(page["hasMore"], false);

    let (_, older) = app
        .get(&format!(
            "/api/v1/users/{}/conversations/{}?before={}",
            alice, bob, times[1]
        ))
        .await;
    assert_eq!(older["items"].as_array().unwrap().len(), 1);
    assert_eq!(older["items"][0]["content"], "m0");
}

#[tokio::test]
async fn test_unread_counts_and_mark_seen() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    for text in ["one", "two"] {
        app.post_json(
            "/api/v1/messages",
            json!({ "from": alice, "to": bob, "content": text }),
        )
        .await;
    }

    let (status, unread) = app.get(&format!("/api/v1/users/{}/unread", bob)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unread, json!([{ "from": alice, "count": 2 }]));

    let (_, seen) = app
        .call("POST", &format!("/api/v1/users/{}/unread/{}/seen", bob, alice))
        .await;
    assert_eq!(seen["cleared"], 1);

    // Second mark is a no-op
    let (_, seen) = app
        .call("POST", &format!("/api/v1/users/{}/unread/{}/seen", bob, alice))
        .await;
    assert_eq!(seen["cleared"], 0);

    let (_, unread) = app.get(&format!("/api/v1/users/{}/unread", bob)).await;
    assert_eq!(unread, json!([]));
}

#[tokio::test]
async fn test_mark_all_seen() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let carol = app.create_user("carol").await;
    for from in [alice, carol] {
        app.post_json(
            "/api/v1/messages",
            json!({ "from": from, "to": bob, "content": "ping" }),
        )
        .await;
    }

    let (_, seen) = app
        .call("POST", &format!("/api/v1/users/{}/unread/seen", bob))
        .await;

    assert_eq!(seen["cleared"], 2);
}
