mod notify;
mod pipeline;
mod resolver;

use std::{future::Future, sync::Arc, time::Duration};

pub use notify::{Clock, NotificationDeduplicator, NotifyOutcome, SystemClock};
pub use pipeline::{Delivered, MessagePipeline, notification_title};
pub use resolver::RoomResolver;

use crate::{
    broadcast::RoomBroadcaster,
    db::ChatStore,
    error::{ChatError, ChatResult},
    models::{
        MessageId, NotificationId, NotificationView, RoomId, RoomMessages, RoomSummary, UserId,
    },
    registry::ConnectionRegistry,
};

/// Entry point the transports call into.
///
/// Every operation runs under `request_timeout`; when it elapses the pending
/// persistence call is dropped and the caller gets [`ChatError::Cancelled`].
/// For sends the deadline covers validation and the insert only.
#[derive(Clone)]
pub struct ChatService {
    store: Arc<dyn ChatStore>,
    resolver: RoomResolver,
    pipeline: MessagePipeline,
    request_timeout: Duration,
}

pub struct ChatServiceBuilder {
    store: Arc<dyn ChatStore>,
    registry: ConnectionRegistry,
    clock: Arc<dyn Clock>,
    room_create_attempts: u32,
    request_timeout: Duration,
}

impl ChatServiceBuilder {
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn room_create_attempts(mut self, attempts: u32) -> Self {
        self.room_create_attempts = attempts;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn build(self) -> ChatService {
        let notifier = NotificationDeduplicator::new(self.store.clone(), self.clock);
        let broadcaster = RoomBroadcaster::new(self.registry);
        ChatService {
            resolver: RoomResolver::new(self.store.clone(), self.room_create_attempts),
            pipeline: MessagePipeline::new(self.store.clone(), broadcaster, notifier),
            store: self.store,
            request_timeout: self.request_timeout,
        }
    }
}

impl ChatService {
    pub fn builder(store: Arc<dyn ChatStore>, registry: ConnectionRegistry) -> ChatServiceBuilder {
        ChatServiceBuilder {
            store,
            registry,
            clock: Arc::new(SystemClock),
            room_create_attempts: 3,
            request_timeout: Duration::from_secs(5),
        }
    }

    async fn bounded<T>(&self, op: impl Future<Output = ChatResult<T>>) -> ChatResult<T> {
        tokio::time::timeout(self.request_timeout, op)
            .await
            .unwrap_or(Err(ChatError::Cancelled))
    }

    pub async fn resolve_room(&self, user: UserId, peer: UserId) -> ChatResult<RoomId> {
        self.bounded(self.resolver.resolve_room(user, peer)).await
    }

    pub async fn authorize_connection(&self, room_id: RoomId, user: UserId) -> ChatResult<()> {
        self.bounded(self.pipeline.authorize(room_id, user)).await
    }

    pub async fn send_message(
        &self,
        room_id: RoomId,
        sender: UserId,
        text: String,
    ) -> ChatResult<MessageId> {
        let sent = self
            .bounded(self.pipeline.deliver(room_id, sender, text))
            .await?;

        let notify = self.pipeline.notify_recipient(&sent);
        if tokio::time::timeout(self.request_timeout, notify).await.is_err() {
            tracing::warn!(
                %room_id,
                recipient = %sent.recipient,
                "notification timed out, message kept"
            );
        }
        Ok(sent.message_id)
    }

    pub async fn get_messages(
        &self,
        room_id: RoomId,
        requester: UserId,
    ) -> ChatResult<RoomMessages> {
        self.bounded(self.pipeline.get_messages(room_id, requester)).await
    }

    pub async fn get_rooms(&self, requester: UserId) -> ChatResult<Vec<RoomSummary>> {
        self.bounded(self.pipeline.get_rooms(requester)).await
    }

    pub async fn list_notifications(&self, requester: UserId) -> ChatResult<Vec<NotificationView>> {
        self.bounded(async {
            let notifications = self.store.list_notifications(requester).await?;
            Ok::<_, ChatError>(notifications.into_iter().map(NotificationView::from).collect())
        })
        .await
    }

    /// Someone else's notification is reported as missing.
    pub async fn mark_notification_read(
        &self,
        id: NotificationId,
        requester: UserId,
    ) -> ChatResult<()> {
        self.bounded(async {
            match self.store.find_notification(id).await? {
                Some(n) if n.recipient_id == requester => {
                    self.store.mark_notification_read(id).await?;
                    Ok::<(), ChatError>(())
                }
                _ => Err(ChatError::NotFound("notification")),
            }
        })
        .await
    }
}
