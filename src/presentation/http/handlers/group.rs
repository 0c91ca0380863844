//! Group Handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::request::{
    AddGroupUsersRequest, CreateGroupRequest, GroupConversationQuery, GroupTypingRequest,
    SendGroupMessageRequest,
};
use crate::domain::{Group, GroupId, GroupMessage, Page, UserId};
use crate::shared::error::AppError;
use crate::shared::validation::validate_request;
use crate::startup::AppState;

/// Create a group
pub async fn create_group(
    State(state): State<AppState>,
    Json(body): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<Group>), AppError> {
    validate_request(&body)?;

    let group = state.groups.create_group(&body.name, body.user_ids).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn get_group(
    State(state): State<AppState>,
    Path(group_id): Path<GroupId>,
) -> Result<Json<Group>, AppError> {
    Ok(Json(state.groups.get_group(group_id).await?))
}

/// Add members to a group
pub async fn add_users(
    State(state): State<AppState>,
    Path(group_id): Path<GroupId>,
    Json(body): Json<AddGroupUsersRequest>,
) -> Result<Json<Group>, AppError> {
    validate_request(&body)?;

    Ok(Json(state.groups.add_users(group_id, body.user_ids).await?))
}

pub async fn remove_user(
    State(state): State<AppState>,
    Path((group_id, user_id)): Path<(GroupId, UserId)>,
) -> Result<Json<Group>, AppError> {
    Ok(Json(state.groups.remove_user(group_id, user_id).await?))
}

/// Post a message to a group
pub async fn send_message(
    State(state): State<AppState>,
    Path(group_id): Path<GroupId>,
    Json(body): Json<SendGroupMessageRequest>,
) -> Result<(StatusCode, Json<GroupMessage>), AppError> {
    validate_request(&body)?;

    let message = state
        .messages
        .send_group(body.from, group_id, &body.content)
        .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

/// One page of the group conversation, newest first
pub async fn get_messages(
    State(state): State<AppState>,
    Path(group_id): Path<GroupId>,
    Query(query): Query<GroupConversationQuery>,
) -> Result<Json<Page<GroupMessage>>, AppError> {
    let page = state
        .messages
        .group_conversation(query.user_id, group_id, query.before.unwrap_or(0))
        .await?;

    Ok(Json(page))
}

pub async fn send_typing(
    State(state): State<AppState>,
    Path(group_id): Path<GroupId>,
    Json(body): Json<GroupTypingRequest>,
) -> Result<StatusCode, AppError> {
    state
        .messages
        .send_typing_to_group(body.user_id, group_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
