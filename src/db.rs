use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use time::{Date, OffsetDateTime, UtcOffset};

use crate::{
    error::StoreError,
    models::{Message, Notification, NotificationId, Room, RoomId, UserId, UserProfile},
};

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable storage for rooms, messages and notifications.
///
/// Every method is a single round trip; callers own retries and deadlines.
#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn find_user(&self, id: UserId) -> StoreResult<Option<UserProfile>>;

    async fn find_room(&self, id: RoomId) -> StoreResult<Option<Room>>;

    /// Looks the pair up in either order.
    async fn find_room_between(&self, a: UserId, b: UserId) -> StoreResult<Option<Room>>;

    /// Fails with [`StoreError::Conflict`] if the pair already has a room.
    async fn create_room(&self, room: &Room) -> StoreResult<()>;

    /// Profiles of everyone `user` shares a room with, in room creation order.
    async fn list_room_peers(&self, user: UserId) -> StoreResult<Vec<UserProfile>>;

    async fn insert_message(&self, message: &Message) -> StoreResult<()>;

    /// Messages in insertion order, each with its sender's profile.
    async fn list_messages(&self, room: RoomId) -> StoreResult<Vec<(Message, UserProfile)>>;

    /// Inserts unless a notification with the same recipient and title already
    /// exists for the UTC day of `notification.created_at`. Returns whether a
    /// row was written. The check and the insert are one statement.
    async fn insert_notification_once(&self, notification: &Notification) -> StoreResult<bool>;

    /// Newest first.
    async fn list_notifications(&self, recipient: UserId) -> StoreResult<Vec<Notification>>;

    async fn find_notification(&self, id: NotificationId) -> StoreResult<Option<Notification>>;

    async fn mark_notification_read(&self, id: NotificationId) -> StoreResult<()>;
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

type RoomRow = (String, String, String, OffsetDateTime);
type ProfileRow = (String, String, String, String, String);
type PeerRow = (
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);
type MessageRow = (
    String,
    String,
    String,
    String,
    OffsetDateTime,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);
type NotificationRow = (String, String, String, String, String, bool, OffsetDateTime);

impl SqliteStore {
    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<SqliteStore> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        Ok(SqliteStore { pool })
    }

    /// A private database living in one pooled connection.
    pub async fn in_memory() -> StoreResult<SqliteStore> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Ok(SqliteStore { pool })
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!()
            .run(&self.pool)
            .await
            .map_err(sqlx::Error::from)?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn room_from_row((id, a, b, created_at): RoomRow) -> StoreResult<Room> {
    Ok(Room {
        id: id.parse()?,
        participant_a: a.parse()?,
        participant_b: b.parse()?,
        created_at,
    })
}

fn profile_from_row(
    (id, name, profile_picture, role, slug): ProfileRow,
) -> StoreResult<UserProfile> {
    Ok(UserProfile {
        id: id.parse()?,
        name,
        profile_picture,
        role,
        slug,
    })
}

/// Profile columns from an outer join; a missing user row reads as anonymous.
fn joined_profile(
    id: UserId,
    name: Option<String>,
    picture: Option<String>,
    role: Option<String>,
    slug: Option<String>,
) -> StoreResult<UserProfile> {
    Ok(match name {
        Some(name) => UserProfile {
            id,
            name,
            profile_picture: picture.unwrap_or_default(),
            role: role.unwrap_or_default(),
            slug: slug.unwrap_or_default(),
        },
        None => UserProfile::anonymous(id),
    })
}

fn message_from_row(row: MessageRow) -> StoreResult<(Message, UserProfile)> {
    let (id, room_id, sender_id, content, created_at, name, picture, role, slug) = row;
    let sender_id: UserId = sender_id.parse()?;
    let sender = joined_profile(sender_id, name, picture, role, slug)?;
    let message = Message {
        id: id.parse()?,
        room_id: room_id.parse()?,
        sender_id,
        content,
        created_at,
    };
    Ok((message, sender))
}

fn notification_from_row(row: NotificationRow) -> StoreResult<Notification> {
    let (id, recipient_id, title, message, notification_type, is_read, created_at) = row;
    Ok(Notification {
        id: id.parse()?,
        recipient_id: recipient_id.parse()?,
        title,
        message,
        notification_type,
        is_read,
        created_at,
    })
}

pub fn utc_day(at: OffsetDateTime) -> Date {
    at.to_offset(UtcOffset::UTC).date()
}

#[async_trait]
impl ChatStore for SqliteStore {
    async fn find_user(&self, id: UserId) -> StoreResult<Option<UserProfile>> {
        sqlx::query_as::<_, ProfileRow>(
            "SELECT id,name,profile_picture,role,slug FROM users WHERE id=?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?
        .map(profile_from_row)
        .transpose()
    }

    async fn find_room(&self, id: RoomId) -> StoreResult<Option<Room>> {
        sqlx::query_as::<_, RoomRow>(
            "SELECT id,participant_a,participant_b,created_at FROM rooms WHERE id=?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?
        .map(room_from_row)
        .transpose()
    }

    async fn find_room_between(&self, a: UserId, b: UserId) -> StoreResult<Option<Room>> {
        let (a, b) = crate::models::canonical_pair(a, b);
        sqlx::query_as::<_, RoomRow>(
            "SELECT id,participant_a,participant_b,created_at FROM rooms \
             WHERE participant_a=? AND participant_b=?",
        )
        .bind(a.to_string())
        .bind(b.to_string())
        .fetch_optional(&self.pool)
        .await?
        .map(room_from_row)
        .transpose()
    }

    async fn create_room(&self, room: &Room) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO rooms (id,participant_a,participant_b,created_at) VALUES (?,?,?,?)",
        )
        .bind(room.id.to_string())
        .bind(room.participant_a.to_string())
        .bind(room.participant_b.to_string())
        .bind(room.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_room_peers(&self, user: UserId) -> StoreResult<Vec<UserProfile>> {
        let user = user.to_string();
        sqlx::query_as::<_, PeerRow>(
            "SELECT p.peer_id,u.name,u.profile_picture,u.role,u.slug FROM \
             (SELECT r.rowid AS seq, \
              CASE WHEN r.participant_a=? THEN r.participant_b \
              ELSE r.participant_a END AS peer_id \
              FROM rooms r WHERE r.participant_a=? OR r.participant_b=?) p \
             LEFT JOIN users u ON u.id = p.peer_id \
             ORDER BY p.seq",
        )
        .bind(&user)
        .bind(&user)
        .bind(&user)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|(peer_id, name, picture, role, slug)| {
            joined_profile(peer_id.parse()?, name, picture, role, slug)
        })
        .collect()
    }

    async fn insert_message(&self, message: &Message) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO messages (id,room_id,sender_id,content,created_at) VALUES (?,?,?,?,?)",
        )
        .bind(message.id.to_string())
        .bind(message.room_id.to_string())
        .bind(message.sender_id.to_string())
        .bind(&message.content)
        .bind(message.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_messages(&self, room: RoomId) -> StoreResult<Vec<(Message, UserProfile)>> {
        sqlx::query_as::<_, MessageRow>(
            "SELECT m.id,m.room_id,m.sender_id,m.content,m.created_at,\
             u.name,u.profile_picture,u.role,u.slug FROM messages m \
             LEFT JOIN users u ON u.id = m.sender_id \
             WHERE m.room_id=? ORDER BY m.rowid",
        )
        .bind(room.to_string())
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(message_from_row)
        .collect()
    }

    async fn insert_notification_once(&self, notification: &Notification) -> StoreResult<bool> {
        let recipient = notification.recipient_id.to_string();
        let day = utc_day(notification.created_at);
        let result = sqlx::query(
            "INSERT INTO notifications \
             (id,recipient_id,title,message,notification_type,is_read,created_at,created_on) \
             SELECT ?,?,?,?,?,?,?,? \
             WHERE NOT EXISTS (SELECT 1 FROM notifications \
             WHERE recipient_id=? AND title=? AND created_on=?)",
        )
        .bind(notification.id.to_string())
        .bind(&recipient)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.notification_type)
        .bind(notification.is_read)
        .bind(notification.created_at)
        .bind(day)
        .bind(&recipient)
        .bind(&notification.title)
        .bind(day)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn list_notifications(&self, recipient: UserId) -> StoreResult<Vec<Notification>> {
        sqlx::query_as::<_, NotificationRow>(
            "SELECT id,recipient_id,title,message,notification_type,is_read,created_at \
             FROM notifications WHERE recipient_id=? ORDER BY rowid DESC",
        )
        .bind(recipient.to_string())
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(notification_from_row)
        .collect()
    }

    async fn find_notification(&self, id: NotificationId) -> StoreResult<Option<Notification>> {
        sqlx::query_as::<_, NotificationRow>(
            "SELECT id,recipient_id,title,message,notification_type,is_read,created_at \
             FROM notifications WHERE id=?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?
        .map(notification_from_row)
        .transpose()
    }

    async fn mark_notification_read(&self, id: NotificationId) -> StoreResult<()> {
        sqlx::query("UPDATE notifications SET is_read=TRUE WHERE id=?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
