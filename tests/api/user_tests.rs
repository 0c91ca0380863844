//! User API Tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;
use test_case::test_case;

use crate::common::TestApp;

// =============================================================================
// Create / Lookup
// =============================================================================

#[tokio::test]
async fn test_create_and_fetch_user() {
    let app = TestApp::new();

    let id = app.create_user("alice").await;

    let (status, body) = app.get(&format!("/api/v1/users/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["details"]["username"], "alice");
    assert_eq!(body["details"]["enabled"], true);
    assert_eq!(body["settings"]["fontSize"], 12);

    let (status, body) = app.get("/api/v1/users/by-username/alice").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.to_string());
}

#[tokio::test]
async fn test_duplicate_username_conflicts() {
    let app = TestApp::new();
    app.create_user("alice").await;

    let (status, body) = app
        .post_json("/api/v1/users", json!({ "username": "alice", "fullname": "Other" }))
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 10005);
}

#[test_case(json!({ "username": "", "fullname": "Nobody" }), "username" ; "empty username")]
#[test_case(json!({ "username": "x".repeat(51), "fullname": "Long" }), "username" ; "long username")]
#[test_case(json!({ "username": "bob", "fullname": "" }), "fullname" ; "empty fullname")]
#[tokio::test]
async fn test_create_user_validation(body: serde_json::Value, field: &str) {
    let app = TestApp::new();

    let (status, response) = app.post_json("/api/v1/users", body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["errors"][0]["field"], field);
}

#[tokio::test]
async fn test_unknown_user_is_not_found() {
    let app = TestApp::new();

    let (status, body) = app
        .get(&format!("/api/v1/users/{}", uuid::Uuid::new_v4()))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 10001);
}

// =============================================================================
// Directory
// =============================================================================

#[tokio::test]
async fn test_list_users_hides_disabled_accounts() {
    let app = TestApp::new();
    app.create_user("alice").await;
    let bob = app.create_user("bob").await;

    let (status, _) = app.call("POST", &format!("/api/v1/users/{}/disable", bob)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.get("/api/v1/users").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["details"]["username"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["alice"]);
    assert_eq!(body[0]["status"], "Offline");
}

#[tokio::test]
async fn test_disable_twice_conflicts_and_enable_restores() {
    let app = TestApp::new();
    let bob = app.create_user("bob").await;

    app.call("POST", &format!("/api/v1/users/{}/disable", bob)).await;
    let (status, _) = app.call("POST", &format!("/api/v1/users/{}/disable", bob)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app.call("POST", &format!("/api/v1/users/{}/enable", bob)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["details"]["enabled"], true);
}

// =============================================================================
// Profile
// =============================================================================

#[tokio::test]
async fn test_update_profile() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;

    let (status, body) = app
        .json(
            "PATCH",
            &format!("/api/v1/users/{}", alice),
            json!({
                "fullname": "Alice Liddell",
                "extension": "4021",
                "settings": {
                    "compactView": true,
                    "soundDisabled": false,
                    "minimizeToTray": false,
                    "keepOpenWindows": true,
                    "fontSize": 14
                }
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["details"]["fullname"], "Alice Liddell");
    assert_eq!(body["details"]["username"], "alice");
    assert_eq!(body["details"]["extension"], "4021");
    assert_eq!(body["settings"]["compactView"], true);
    assert_eq!(body["settings"]["fontSize"], 14);
}

#[tokio::test]
async fn test_update_profile_rejects_font_size() {
    let app = TestApp::new();
    let alice = app.create_user("alice").await;

    let (status, body) = app
        .json(
            "PATCH",
            &format!("/api/v1/users/{}", alice),
            json!({
                "settings": {
                    "compactView": false,
                    "soundDisabled": false,
                    "minimizeToTray": false,
                    "keepOpenWindows": true,
                    "fontSize": 0
                }
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 10007);
}
