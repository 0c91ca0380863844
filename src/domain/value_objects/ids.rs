//! Opaque identifiers and canonical conversation keys.
//!
//! Every identifier is a UUID newtype so that a `UserId` can never be passed
//! where a `GroupId` is expected. Message ids are UUIDv7 (time-ordered); the
//! rest are random v4.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $ctor:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a fresh identifier.
            pub fn new() -> Self {
                Self(Uuid::$ctor())
            }

            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

uuid_id!(
    /// Identifies a user account.
    UserId,
    new_v4
);
uuid_id!(
    /// Identifies a group conversation.
    GroupId,
    new_v4
);
uuid_id!(
    /// Identifies a stored message.
    MessageId,
    now_v7
);
uuid_id!(
    /// Identifies one live client connection.
    SessionId,
    new_v4
);

/// Canonical key of a message stream.
///
/// Both participants of a direct conversation compute the same key
/// regardless of who sends, because the smaller id is always placed first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationKey(String);

impl ConversationKey {
    const GROUP_PREFIX: &'static str = "group:";

    /// Key of the two-party conversation between `a` and `b`.
    pub fn direct(a: UserId, b: UserId) -> Self {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        Self(format!("{}:{}", low, high))
    }

    /// Key of a group conversation.
    pub fn group(group_id: GroupId) -> Self {
        Self(format!("{}{}", Self::GROUP_PREFIX, group_id))
    }

    /// Rehydrate a key read back from storage.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_group(&self) -> bool {
        self.0.starts_with(Self::GROUP_PREFIX)
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_key_is_order_independent() {
        let a = UserId::new();
        let b = UserId::new();

        assert_eq!(ConversationKey::direct(a, b), ConversationKey::direct(b, a));
        assert!(!ConversationKey::direct(a, b).is_group());
    }

    #[test]
    fn test_direct_key_puts_smaller_id_first() {
        let low = UserId::from_uuid(Uuid::from_u128(1));
        let high = UserId::from_uuid(Uuid::from_u128(2));

        let key = ConversationKey::direct(high, low);

        assert_eq!(key.as_str(), format!("{}:{}", low, high));
    }

    #[test]
    fn test_group_key() {
        let group = GroupId::new();
        let key = ConversationKey::group(group);

        assert!(key.is_group());
        assert_eq!(key.to_string(), format!("group:{}", group));
    }

    #[test]
    fn test_id_round_trips_through_display() {
        let id = SessionId::new();
        let parsed: SessionId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<UserId>().is_err());
    }

    #[test]
    fn test_message_ids_are_time_ordered() {
        let first = MessageId::new();
        let second = MessageId::new();
        assert_eq!(first.as_uuid().get_version_num(), 7);
        assert!(first != second);
    }
}
