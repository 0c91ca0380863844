//! Route Configuration
//!
//! Configures all HTTP routes for the API.

use axum::{
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};

use super::handlers;
use crate::infrastructure::metrics;
use crate::presentation::websocket::ws_handler;
use crate::startup::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_routes())
        // Realtime session endpoint
        .route("/session/user/{user_id}", get(ws_handler))
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    let metrics = metrics::gather_metrics();
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
}

/// API v1 routes
fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/users", user_routes())
        .nest("/messages", message_routes())
        .nest("/groups", group_routes())
}

/// User directory, profile, unread and direct conversation routes
fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::user::list_users).post(handlers::user::create_user),
        )
        .route(
            "/by-username/{username}",
            get(handlers::user::get_user_by_username),
        )
        .route(
            "/{user_id}",
            get(handlers::user::get_user).patch(handlers::user::update_user),
        )
        .route("/{user_id}/info", get(handlers::user::get_user_info))
        .route("/{user_id}/enable", post(handlers::user::enable_user))
        .route("/{user_id}/disable", post(handlers::user::disable_user))
        .route("/{user_id}/unread", get(handlers::user::get_unread))
        .route("/{user_id}/unread/seen", post(handlers::user::mark_all_seen))
        .route(
            "/{user_id}/unread/{sender_id}/seen",
            post(handlers::user::mark_seen),
        )
        .route(
            "/{user_id}/conversations/{other_id}",
            get(handlers::user::get_conversation),
        )
        .route(
            "/{user_id}/typing/{other_id}",
            post(handlers::user::send_typing),
        )
}

/// Direct message routes
fn message_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::message::send_message))
        .route("/{message_id}", get(handlers::message::get_message))
        .route(
            "/group/{message_id}",
            get(handlers::message::get_group_message),
        )
}

/// Group and group message routes
fn group_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::group::create_group))
        .route("/{group_id}", get(handlers::group::get_group))
        .route("/{group_id}/users", post(handlers::group::add_users))
        .route(
            "/{group_id}/users/{user_id}",
            delete(handlers::group::remove_user),
        )
        .route(
            "/{group_id}/messages",
            get(handlers::group::get_messages).post(handlers::group::send_message),
        )
        .route("/{group_id}/typing", post(handlers::group::send_typing))
}
