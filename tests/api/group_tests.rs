//! Group API Tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::TestApp;

#[tokio::test]
async fn test_group_lifecycle() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let carol = app.create_user("carol").await;

    let (status, group) = app
        .post_json(
            "/api/v1/groups",
            json!({ "name": "platform", "userIds": [alice, bob] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let group_id = group["id"].as_str().unwrap().to_string();

    let (status, group) = app
        .post_json(
            &format!("/api/v1/groups/{}/users", group_id),
            json!({ "userIds": [carol] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(group["userIds"].as_array().unwrap().len(), 3);

    let (status, group) = app
        .call("DELETE", &format!("/api/v1/groups/{}/users/{}", group_id, bob))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(group["userIds"].as_array().unwrap().len(), 2);

    let (status, fetched) = app.get(&format!("/api/v1/groups/{}", group_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, group);
}

#[tokio::test]
async fn test_group_needs_two_enabled_members() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    app.call("POST", &format!("/api/v1/users/{}/disable", bob)).await;

    let (status, body) = app
        .post_json(
            "/api/v1/groups",
            json!({ "name": "solo", "userIds": [alice, bob] }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 10002);
}

#[tokio::test]
async fn test_group_messages() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let outsider = app.create_user("mallory").await;
    let (_, group) = app
        .post_json(
            "/api/v1/groups",
            json!({ "name": "pair", "userIds": [alice, bob] }),
        )
        .await;
    let group_id = group["id"].as_str().unwrap().to_string();

    let (status, sent) = app
        .post_json(
            &format!("/api/v1/groups/{}/messages", group_id),
            json!({ "from": alice, "content": "hi all" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, page) = app
        .get(&format!(
            "/api/v1/groups/{}/messages?userId={}",
            group_id, bob
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["items"][0], sent);

    let (status, fetched) = app
        .get(&format!(
            "/api/v1/messages/group/{}",
            sent["id"].as_str().unwrap()
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, sent);

    let (status, _) = app
        .post_json(
            &format!("/api/v1/groups/{}/messages", group_id),
            json!({ "from": outsider, "content": "let me in" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
