use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

macro_rules! id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

id_type!(UserId);
id_type!(RoomId);
id_type!(MessageId);
id_type!(NotificationId);

/// Type tag stored on notifications created for chat activity.
pub const MESSAGE_NOTIFICATION: &str = "message";

/// A durable one-to-one channel.
///
/// The pair is kept in sorted order so that `{a, b}` and `{b, a}` are the
/// same value; that order is also what the storage uniqueness constraint sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub id: RoomId,
    pub participant_a: UserId,
    pub participant_b: UserId,
    pub created_at: OffsetDateTime,
}

impl Room {
    /// Caller guarantees `a != b`.
    pub fn between(a: UserId, b: UserId) -> Room {
        let (participant_a, participant_b) = canonical_pair(a, b);
        Room {
            id: RoomId::new(),
            participant_a,
            participant_b,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn has_participant(&self, user: UserId) -> bool {
        self.participant_a == user || self.participant_b == user
    }

    /// The other participant, or `None` if `user` is not in the room.
    pub fn peer_of(&self, user: UserId) -> Option<UserId> {
        if self.participant_a == user {
            Some(self.participant_b)
        } else if self.participant_b == user {
            Some(self.participant_a)
        } else {
            None
        }
    }
}

pub fn canonical_pair(a: UserId, b: UserId) -> (UserId, UserId) {
    if a <= b { (a, b) } else { (b, a) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub room_id: RoomId,
    pub sender_id: UserId,
    pub content: String,
    pub created_at: OffsetDateTime,
}

impl Message {
    pub fn new(room_id: RoomId, sender_id: UserId, content: String) -> Message {
        Message {
            id: MessageId::new(),
            room_id,
            sender_id,
            content,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient_id: UserId,
    pub title: String,
    pub message: String,
    pub notification_type: String,
    pub is_read: bool,
    pub created_at: OffsetDateTime,
}

/// Public attributes of a user, as owned by the user feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub profile_picture: String,
    pub role: String,
    pub slug: String,
}

impl UserProfile {
    /// Stand-in used when a user record has gone missing.
    pub fn anonymous(id: UserId) -> UserProfile {
        UserProfile {
            id,
            name: "Anonymous".to_owned(),
            profile_picture: String::new(),
            role: String::new(),
            slug: String::new(),
        }
    }
}

/// A message as it travels over the WebSocket, in both directions.
///
/// Inbound `sender` and `profile_picture` are advisory and never trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageFrame {
    pub message: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub profile_picture: String,
}

impl MessageFrame {
    pub fn from_profile(message: String, sender: &UserProfile) -> MessageFrame {
        MessageFrame {
            message,
            sender: sender.name.clone(),
            profile_picture: sender.profile_picture.clone(),
        }
    }
}

/// One entry of the caller's room list: who they are talking with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomSummary {
    pub id: UserId,
    pub name: String,
    pub profile_picture: String,
    #[serde(rename = "type")]
    pub role: String,
    pub slug: String,
}

impl From<UserProfile> for RoomSummary {
    fn from(peer: UserProfile) -> Self {
        RoomSummary {
            id: peer.id,
            name: peer.name,
            profile_picture: peer.profile_picture,
            role: peer.role,
            slug: peer.slug,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomHandle {
    pub id: RoomId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    pub room_id: String,
    pub message: String,
}

/// A room's history, labelled with the peer the caller is talking to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomMessages {
    pub id: RoomId,
    pub name: String,
    pub profile_picture: String,
    pub messages: Vec<MessageFrame>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationView {
    pub id: NotificationId,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    #[serde(rename = "type")]
    pub notification_type: String,
}

impl From<Notification> for NotificationView {
    fn from(n: Notification) -> Self {
        NotificationView {
            id: n.id,
            title: n.title,
            message: n.message,
            is_read: n.is_read,
            notification_type: n.notification_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_pair_is_order_invariant() {
        let u = UserId::new();
        let v = UserId::new();
        let r1 = Room::between(u, v);
        let r2 = Room::between(v, u);
        assert_eq!(
            (r1.participant_a, r1.participant_b),
            (r2.participant_a, r2.participant_b)
        );
        assert!(r1.participant_a < r1.participant_b);
    }

    #[test]
    fn peer_of_returns_the_other_side() {
        let u = UserId::new();
        let v = UserId::new();
        let room = Room::between(u, v);
        assert_eq!(room.peer_of(u), Some(v));
        assert_eq!(room.peer_of(v), Some(u));
        assert_eq!(room.peer_of(UserId::new()), None);
    }

    #[test]
    fn inbound_frame_tolerates_missing_advisory_fields() {
        let frame: MessageFrame = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();
        assert_eq!(frame.message, "hi");
        assert!(frame.sender.is_empty());
    }

    #[test]
    fn room_summary_serializes_role_as_type() {
        let summary = RoomSummary::from(UserProfile {
            id: UserId::new(),
            name: "Ada".into(),
            profile_picture: "a.png".into(),
            role: "company".into(),
            slug: "ada".into(),
        });
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["type"], "company");
        assert_eq!(json["slug"], "ada");
    }
}
