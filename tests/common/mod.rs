#![allow(dead_code)]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use pairchat::{
    db::{ChatStore, SqliteStore, StoreResult},
    error::StoreError,
    models::{Message, Notification, NotificationId, Room, RoomId, UserId, UserProfile},
    registry::ConnectionRegistry,
    services::{ChatService, Clock},
};
use time::{OffsetDateTime, macros::datetime};

pub struct Fixture {
    pub store: SqliteStore,
    pub registry: ConnectionRegistry,
    pub clock: Arc<FixedClock>,
    pub chat: ChatService,
}

impl Fixture {
    pub async fn new() -> Fixture {
        let store = SqliteStore::in_memory().await.unwrap();
        store.migrate().await.unwrap();
        let registry = ConnectionRegistry::new();
        let clock = Arc::new(FixedClock::new(datetime!(2026-03-14 09:00 UTC)));
        let chat = ChatService::builder(Arc::new(store.clone()), registry.clone())
            .clock(clock.clone())
            .build();
        Fixture {
            store,
            registry,
            clock,
            chat,
        }
    }

    pub async fn user(&self, name: &str) -> UserId {
        let id = UserId::new();
        sqlx::query("INSERT INTO users (id,name,profile_picture,role,slug) VALUES (?,?,?,?,?)")
            .bind(id.to_string())
            .bind(name)
            .bind(format!("{}.png", name.to_lowercase()))
            .bind("user")
            .bind(name.to_lowercase())
            .execute(self.store.pool())
            .await
            .unwrap();
        id
    }

    pub async fn count(&self, table: &str) -> i64 {
        let (n,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(self.store.pool())
            .await
            .unwrap();
        n
    }
}

pub struct FixedClock(Mutex<OffsetDateTime>);

impl FixedClock {
    pub fn new(at: OffsetDateTime) -> FixedClock {
        FixedClock(Mutex::new(at))
    }

    pub fn advance(&self, by: time::Duration) {
        let mut now = self.0.lock().unwrap();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        *self.0.lock().unwrap()
    }
}

#[derive(Clone, Copy)]
pub enum Fault {
    /// Room creation always conflicts and lookups never see the winner.
    PhantomConflict,
    /// User lookups stall for this long.
    SlowUsers(Duration),
    NotificationsDown,
    /// Notification inserts stall for this long before reaching storage.
    SlowNotifications(Duration),
}

/// Wraps the real store and breaks one thing on purpose.
pub struct FaultyStore {
    pub inner: SqliteStore,
    pub fault: Fault,
}

impl FaultyStore {
    pub fn service(fixture: &Fixture, fault: Fault, request_timeout: Duration) -> ChatService {
        let store = FaultyStore {
            inner: fixture.store.clone(),
            fault,
        };
        ChatService::builder(Arc::new(store), fixture.registry.clone())
            .clock(fixture.clock.clone())
            .request_timeout(request_timeout)
            .build()
    }
}

#[async_trait]
impl ChatStore for FaultyStore {
    async fn find_user(&self, id: UserId) -> StoreResult<Option<UserProfile>> {
        if let Fault::SlowUsers(delay) = self.fault {
            tokio::time::sleep(delay).await;
        }
        self.inner.find_user(id).await
    }

    async fn find_room(&self, id: RoomId) -> StoreResult<Option<Room>> {
        self.inner.find_room(id).await
    }

    async fn find_room_between(&self, a: UserId, b: UserId) -> StoreResult<Option<Room>> {
        match self.fault {
            Fault::PhantomConflict => Ok(None),
            _ => self.inner.find_room_between(a, b).await,
        }
    }

    async fn create_room(&self, room: &Room) -> StoreResult<()> {
        match self.fault {
            Fault::PhantomConflict => Err(StoreError::Conflict),
            _ => self.inner.create_room(room).await,
        }
    }

    async fn list_room_peers(&self, user: UserId) -> StoreResult<Vec<UserProfile>> {
        self.inner.list_room_peers(user).await
    }

    async fn insert_message(&self, message: &Message) -> StoreResult<()> {
        self.inner.insert_message(message).await
    }

    async fn list_messages(&self, room: RoomId) -> StoreResult<Vec<(Message, UserProfile)>> {
        self.inner.list_messages(room).await
    }

    async fn insert_notification_once(&self, notification: &Notification) -> StoreResult<bool> {
        match self.fault {
            Fault::NotificationsDown => Err(StoreError::Corrupt("notifications offline".into())),
            Fault::SlowNotifications(delay) => {
                tokio::time::sleep(delay).await;
                self.inner.insert_notification_once(notification).await
            }
            _ => self.inner.insert_notification_once(notification).await,
        }
    }

    async fn list_notifications(&self, recipient: UserId) -> StoreResult<Vec<Notification>> {
        self.inner.list_notifications(recipient).await
    }

    async fn find_notification(&self, id: NotificationId) -> StoreResult<Option<Notification>> {
        self.inner.find_notification(id).await
    }

    async fn mark_notification_read(&self, id: NotificationId) -> StoreResult<()> {
        self.inner.mark_notification_read(id).await
    }
}
