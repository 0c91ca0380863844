//! Request DTOs
//!
//! Data structures for API request bodies.

use serde::Deserialize;
use validator::Validate;

use crate::domain::{GroupId, Status, UserId, UserSettings};

/// Create user request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 50, message = "Username must be 1-50 characters"))]
    pub username: String,

    #[validate(length(min = 1, max = 50, message = "Full name must be 1-50 characters"))]
    pub fullname: String,

    #[validate(length(max = 50, message = "Extension must be at most 50 characters"))]
    pub extension: Option<String>,
}

/// Client preferences as sent by the client
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRequest {
    pub compact_view: bool,
    pub sound_disabled: bool,
    pub minimize_to_tray: bool,
    pub keep_open_windows: bool,

    #[validate(range(min = 1, max = 200, message = "Font size must be 1-200"))]
    pub font_size: u32,
}

impl From<SettingsRequest> for UserSettings {
    fn from(request: SettingsRequest) -> Self {
        Self {
            compact_view: request.compact_view,
            sound_disabled: request.sound_disabled,
            minimize_to_tray: request.minimize_to_tray,
            keep_open_windows: request.keep_open_windows,
            font_size: request.font_size,
        }
    }
}

/// Update profile request. Username and enabled flag are not editable here.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 50, message = "Full name must be 1-50 characters"))]
    pub fullname: Option<String>,

    #[validate(length(max = 50, message = "Extension must be at most 50 characters"))]
    pub extension: Option<String>,

    #[validate(nested)]
    pub settings: Option<SettingsRequest>,
}

/// Send direct message request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendDirectMessageRequest {
    pub from: UserId,
    pub to: UserId,

    #[validate(length(min = 1, max = 2000, message = "Content must be 1-2000 characters"))]
    pub content: String,
}

/// Send group message request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendGroupMessageRequest {
    pub from: UserId,

    #[validate(length(min = 1, max = 2000, message = "Content must be 1-2000 characters"))]
    pub content: String,
}

/// Create group request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: String,

    #[validate(length(min = 2, message = "A group needs at least 2 members"))]
    pub user_ids: Vec<UserId>,
}

/// Add group members request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddGroupUsersRequest {
    #[validate(length(min = 1, message = "At least one user is required"))]
    pub user_ids: Vec<UserId>,
}

/// Typing ping in a group
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupTypingRequest {
    pub user_id: UserId,
}

/// Conversation paging parameters
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationQuery {
    /// Only messages strictly older than this time; absent or `<= 0` means latest
    pub before: Option<i64>,
}

/// Group conversation paging parameters
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupConversationQuery {
    pub user_id: UserId,
    pub before: Option<i64>,
}

/// Frame sent by a client over its realtime session
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum ClientFrame {
    /// Presence report for this session
    Status { status: Status },
    /// Typing ping to another user
    Typing { to: UserId },
    /// Typing ping to a group
    GroupTyping {
        #[serde(rename = "groupId")]
        group_id: GroupId,
    },
}
