//! Message Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::request::SendDirectMessageRequest;
use crate::domain::{GroupMessage, Message, MessageId};
use crate::shared::error::AppError;
use crate::shared::validation::validate_request;
use crate::startup::AppState;

/// Send a direct message
pub async fn send_message(
    State(state): State<AppState>,
    Json(body): Json<SendDirectMessageRequest>,
) -> Result<(StatusCode, Json<Message>), AppError> {
    validate_request(&body)?;

    let message = state
        .messages
        .send_direct(body.from, body.to, &body.content)
        .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn get_message(
    State(state): State<AppState>,
    Path(message_id): Path<MessageId>,
) -> Result<Json<Message>, AppError> {
    Ok(Json(state.messages.get_message(message_id).await?))
}

pub async fn get_group_message(
    State(state): State<AppState>,
    Path(message_id): Path<MessageId>,
) -> Result<Json<GroupMessage>, AppError> {
    Ok(Json(state.messages.get_group_message(message_id).await?))
}
