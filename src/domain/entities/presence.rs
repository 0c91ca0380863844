//! Presence status reported by a session and aggregated per user.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::shared::clock::now_millis;
use crate::shared::error::AppError;

/// Presence states a client can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Status {
    #[default]
    Offline,
    ConnectionInProgress,
    Available,
    ComputerLocked,
    Away,
    #[serde(rename = "BRB")]
    Brb,
    Busy,
    InAMeeting,
    DoNotDisturb,
    Invisible,
}

impl Status {
    pub const ALL: [Status; 10] = [
        Status::Offline,
        Status::ConnectionInProgress,
        Status::Available,
        Status::ComputerLocked,
        Status::Away,
        Status::Brb,
        Status::Busy,
        Status::InAMeeting,
        Status::DoNotDisturb,
        Status::Invisible,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Offline => "Offline",
            Self::ConnectionInProgress => "ConnectionInProgress",
            Self::Available => "Available",
            Self::ComputerLocked => "ComputerLocked",
            Self::Away => "Away",
            Self::Brb => "BRB",
            Self::Busy => "Busy",
            Self::InAMeeting => "InAMeeting",
            Self::DoNotDisturb => "DoNotDisturb",
            Self::Invisible => "Invisible",
        }
    }

    /// ComputerLocked ranks below every other report.
    fn rank(&self) -> u8 {
        match self {
            Self::ComputerLocked => 0,
            _ => 1,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .iter()
            .copied()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AppError::Invalid(format!("Unknown status: {}", s)))
    }
}

/// A status together with the time it was reported (Unix millis).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceStatus {
    pub status: Status,
    pub reported_at: i64,
}

impl PresenceStatus {
    pub fn new(status: Status, reported_at: i64) -> Self {
        Self {
            status,
            reported_at,
        }
    }

    /// `status` reported right now.
    pub fn now(status: Status) -> Self {
        Self::new(status, now_millis())
    }

    /// Initial state of a freshly opened session. Any real report outranks it.
    pub fn connecting() -> Self {
        Self::new(Status::ConnectionInProgress, 0)
    }

    pub fn is_offline(&self) -> bool {
        self.status == Status::Offline
    }

    /// Ordering key for aggregation; the greatest key wins.
    pub fn rank_key(&self) -> (u8, i64) {
        (self.status.rank(), self.reported_at)
    }
}
