//! Response DTOs
//!
//! Data structures for API response bodies that are not plain domain types.

use serde::Serialize;

use crate::domain::UserId;

/// Unseen messages from one sender
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountResponse {
    pub from: UserId,
    pub count: u64,
}

/// Result of a mark-seen request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeenResponse {
    pub cleared: usize,
}
