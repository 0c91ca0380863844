//! Presence Aggregation Tests

use pretty_assertions::assert_eq;
use tokio_test::{assert_err, assert_ok};

use messenger_server::domain::events::UserStatusChanged;
use messenger_server::domain::{ServerEvent, SessionId, Status};

use crate::common::{RecordingTransport, TestApp};

#[tokio::test]
async fn test_busy_outranks_computer_locked_across_sessions() {
    let app = TestApp::new();
    let user = app.create_user("ursula").await;
    let presence = &app.state.presence;
    let s1 = SessionId::new();
    let s2 = SessionId::new();
    presence.open(user, s1, RecordingTransport::new()).await.unwrap();
    presence.open(user, s2, RecordingTransport::new()).await.unwrap();

    assert_ok!(presence.set_status(user, s1, Status::Busy).await);
    let aggregate = presence
        .set_status(user, s2, Status::ComputerLocked)
        .await
        .unwrap();
    assert_eq!(aggregate, Status::Busy);

    presence.close(s1).await;
    assert_eq!(presence.current_status(user), Status::ComputerLocked);

    presence.close(s2).await;
    assert_eq!(presence.current_status(user), Status::Offline);
    assert!(app.state.registry.sessions_for(user).is_empty());
    assert!(!app.state.registry.is_online(user));
}

#[tokio::test]
async fn test_observers_see_each_change_once() {
    let app = TestApp::new();
    let user = app.create_user("ursula").await;
    let watcher = app.create_user("walter").await;
    let watcher_tab = RecordingTransport::new();
    let presence = &app.state.presence;
    presence
        .open(watcher, SessionId::new(), watcher_tab.clone())
        .await
        .unwrap();

    let session = SessionId::new();
    presence.open(user, session, RecordingTransport::new()).await.unwrap();
    presence.set_status(user, session, Status::Away).await.unwrap();
    presence.set_status(user, session, Status::Away).await.unwrap();
    presence.close(session).await;

    let statuses: Vec<Status> = watcher_tab
        .events()
        .into_iter()
        .filter_map(|event| match event {
            ServerEvent::UpdateUserStatus(UserStatusChanged { id, status }) if id == user => {
                Some(status)
            }
            _ => None,
        })
        .collect();
    assert_eq!(
        statuses,
        vec![Status::ConnectionInProgress, Status::Away, Status::Offline]
    );
}

#[tokio::test]
async fn test_own_sessions_do_not_receive_own_status() {
    let app = TestApp::new();
    let user = app.create_user("ursula").await;
    let phone = RecordingTransport::new();
    let presence = &app.state.presence;
    presence.open(user, SessionId::new(), phone.clone()).await.unwrap();

    let desktop = SessionId::new();
    presence.open(user, desktop, RecordingTransport::new()).await.unwrap();
    presence.set_status(user, desktop, Status::DoNotDisturb).await.unwrap();

    assert_eq!(phone.categories(), vec!["newsession"]);
}

#[tokio::test]
async fn test_closing_unknown_session_is_a_no_op() {
    let app = TestApp::new();
    let user = app.create_user("ursula").await;
    let presence = &app.state.presence;
    presence
        .open(user, SessionId::new(), RecordingTransport::new())
        .await
        .unwrap();

    assert_eq!(presence.close(SessionId::new()).await, None);
    assert_eq!(presence.error(SessionId::new()).await, None);
    assert_eq!(app.state.registry.session_count(), 1);
}

#[tokio::test]
async fn test_disabling_user_closes_their_sessions() {
    let app = TestApp::new();
    let user = app.create_user("ursula").await;
    let tab = RecordingTransport::new();
    app.state
        .presence
        .open(user, SessionId::new(), tab.clone())
        .await
        .unwrap();

    app.state.users.disable_user(user).await.unwrap();

    assert!(tab.is_closed());
    assert_eq!(app.state.registry.session_count(), 0);
    assert_err!(
        app.state
            .presence
            .open(user, SessionId::new(), RecordingTransport::new())
            .await
    );
}
