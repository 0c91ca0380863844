//! Outbound events delivered to live sessions.
//!
//! Serialized as `{"category": "<code>", "content": <payload>}`.

use serde::{Deserialize, Serialize};

use super::entities::{Group, GroupMessage, Message, Status, User, UserDetails};
use super::value_objects::{GroupId, SessionId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", content = "content")]
pub enum ServerEvent {
    #[serde(rename = "dm")]
    DirectMessage(Message),
    #[serde(rename = "gm")]
    GroupMessage(GroupMessage),
    #[serde(rename = "ping")]
    UserTypingPing(TypingPing),
    #[serde(rename = "gping")]
    GroupTypingPing(GroupTypingPing),
    #[serde(rename = "newgroup")]
    NewGroup(Group),
    #[serde(rename = "addgusers")]
    UsersAddedToGroup(GroupUsers),
    #[serde(rename = "rmguser")]
    UserRemovedFromGroup(GroupUser),
    #[serde(rename = "newuser")]
    NewUser(User),
    #[serde(rename = "udetails")]
    UpdateUserDetails(UserDetailsChanged),
    #[serde(rename = "ustatus")]
    UpdateUserStatus(UserStatusChanged),
    #[serde(rename = "deluser")]
    DisableUser(UserRef),
    #[serde(rename = "newsession")]
    EstablishedSession(SessionRef),
    #[serde(rename = "delsession")]
    CloseSession(SessionClosed),
}

impl ServerEvent {
    /// Wire category code, also used as a metrics label
    pub fn category(&self) -> &'static str {
        match self {
            ServerEvent::DirectMessage(_) => "dm",
            ServerEvent::GroupMessage(_) => "gm",
            ServerEvent::UserTypingPing(_) => "ping",
            ServerEvent::GroupTypingPing(_) => "gping",
            ServerEvent::NewGroup(_) => "newgroup",
            ServerEvent::UsersAddedToGroup(_) => "addgusers",
            ServerEvent::UserRemovedFromGroup(_) => "rmguser",
            ServerEvent::NewUser(_) => "newuser",
            ServerEvent::UpdateUserDetails(_) => "udetails",
            ServerEvent::UpdateUserStatus(_) => "ustatus",
            ServerEvent::DisableUser(_) => "deluser",
            ServerEvent::EstablishedSession(_) => "newsession",
            ServerEvent::CloseSession(_) => "delsession",
        }
    }

    pub fn user_status(id: UserId, status: Status) -> Self {
        ServerEvent::UpdateUserStatus(UserStatusChanged { id, status })
    }

    pub fn close_session(reason: impl Into<String>) -> Self {
        ServerEvent::CloseSession(SessionClosed {
            reason: reason.into(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPing {
    pub from: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupTypingPing {
    pub group_id: GroupId,
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupUsers {
    pub group_id: GroupId,
    pub user_ids: Vec<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupUser {
    pub group_id: GroupId,
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetailsChanged {
    pub id: UserId,
    pub details: UserDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatusChanged {
    pub id: UserId,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRef {
    pub session_id: SessionId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClosed {
    pub reason: String,
}
