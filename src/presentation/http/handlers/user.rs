//! User Handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::request::{ConversationQuery, CreateUserRequest, UpdateProfileRequest};
use crate::application::dto::response::{SeenResponse, UnreadCountResponse};
use crate::application::services::{NewUserDto, UpdateProfileDto};
use crate::domain::{Message, Page, User, UserId, UserInfo};
use crate::shared::error::AppError;
use crate::shared::validation::validate_request;
use crate::startup::AppState;

/// List every enabled user with their presence
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserInfo>>, AppError> {
    Ok(Json(state.users.all_user_info().await?))
}

/// Create a user
pub async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    validate_request(&body)?;

    let user = state
        .users
        .create_user(NewUserDto {
            username: body.username,
            fullname: body.fullname,
            extension: body.extension,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Get user by ID, including private settings
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.users.get_user(user_id).await?))
}

pub async fn get_user_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.users.get_user_by_username(&username).await?))
}

/// Directory details and presence of one user
pub async fn get_user_info(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<UserInfo>, AppError> {
    Ok(Json(state.users.user_info(user_id).await?))
}

/// Update profile details and settings
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<User>, AppError> {
    validate_request(&body)?;

    let update = UpdateProfileDto {
        fullname: body.fullname,
        extension: body.extension,
        settings: body.settings.map(Into::into),
    };

    Ok(Json(state.users.update_profile(user_id, update).await?))
}

pub async fn enable_user(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.users.enable_user(user_id).await?))
}

/// Disable a user and close every session they have open
pub async fn disable_user(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.users.disable_user(user_id).await?))
}

/// Unseen message counts per sender
pub async fn get_unread(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<UnreadCountResponse>>, AppError> {
    let counts = state.messages.unread_counts(user_id).await?;

    let mut response: Vec<UnreadCountResponse> = counts
        .into_iter()
        .map(|(from, count)| UnreadCountResponse { from, count })
        .collect();
    response.sort_by_key(|entry| entry.from);

    Ok(Json(response))
}

pub async fn mark_seen(
    State(state): State<AppState>,
    Path((user_id, sender_id)): Path<(UserId, UserId)>,
) -> Json<SeenResponse> {
    let cleared = usize::from(state.messages.mark_seen(user_id, sender_id));
    Json(SeenResponse { cleared })
}

pub async fn mark_all_seen(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Json<SeenResponse> {
    Json(SeenResponse {
        cleared: state.messages.mark_all_seen(user_id),
    })
}

/// One page of the direct conversation with `other_id`, newest first
pub async fn get_conversation(
    State(state): State<AppState>,
    Path((user_id, other_id)): Path<(UserId, UserId)>,
    Query(query): Query<ConversationQuery>,
) -> Result<Json<Page<Message>>, AppError> {
    let page = state
        .messages
        .direct_conversation(user_id, other_id, query.before.unwrap_or(0))
        .await?;

    Ok(Json(page))
}

/// Typing ping from `user_id` to `other_id`
pub async fn send_typing(
    State(state): State<AppState>,
    Path((user_id, other_id)): Path<(UserId, UserId)>,
) -> Result<StatusCode, AppError> {
    state.messages.send_typing_to_user(user_id, other_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
