use std::sync::Arc;

use crate::{
    broadcast::RoomBroadcaster,
    db::ChatStore,
    error::{ChatError, ChatResult},
    models::{
        Message, MessageFrame, MessageId, Room, RoomId, RoomMessages, RoomSummary, UserId,
        UserProfile,
    },
};

use super::notify::NotificationDeduplicator;

pub fn notification_title(sender: &UserProfile) -> String {
    format!("New message from {}", sender.name)
}

/// A stored and broadcast message whose recipient still needs notifying.
#[derive(Debug, Clone)]
pub struct Delivered {
    pub message_id: MessageId,
    pub room_id: RoomId,
    pub recipient: UserId,
    pub title: String,
    pub body: String,
}

/// Validates, persists and fans out room messages.
#[derive(Clone)]
pub struct MessagePipeline {
    store: Arc<dyn ChatStore>,
    broadcaster: RoomBroadcaster,
    notifier: NotificationDeduplicator,
}

impl MessagePipeline {
    pub fn new(
        store: Arc<dyn ChatStore>,
        broadcaster: RoomBroadcaster,
        notifier: NotificationDeduplicator,
    ) -> Self {
        Self {
            store,
            broadcaster,
            notifier,
        }
    }

    async fn room_for(&self, room_id: RoomId, user: UserId) -> ChatResult<Room> {
        let room = self
            .store
            .find_room(room_id)
            .await?
            .ok_or(ChatError::NotFound("room"))?;
        if !room.has_participant(user) {
            return Err(ChatError::Forbidden);
        }
        Ok(room)
    }

    async fn profile(&self, user: UserId) -> ChatResult<UserProfile> {
        Ok(self
            .store
            .find_user(user)
            .await?
            .unwrap_or_else(|| UserProfile::anonymous(user)))
    }

    /// Checks that `user` may open a live connection on `room_id`.
    pub async fn authorize(&self, room_id: RoomId, user: UserId) -> ChatResult<()> {
        self.room_for(room_id, user).await.map(|_| ())
    }

    /// Validates and persists a message, then fans it out to the room.
    ///
    /// The broadcast follows the insert with no await in between, so live
    /// connections see messages in the order they were stored. The
    /// notification is left to [`MessagePipeline::notify_recipient`].
    pub async fn deliver(
        &self,
        room_id: RoomId,
        sender_id: UserId,
        text: String,
    ) -> ChatResult<Delivered> {
        if text.trim().is_empty() {
            return Err(ChatError::InvalidRequest("message is empty".into()));
        }
        let room = self.room_for(room_id, sender_id).await?;
        let recipient = room.peer_of(sender_id).ok_or(ChatError::Forbidden)?;
        let sender = self.profile(sender_id).await?;

        let message = Message::new(room_id, sender_id, text);
        self.store.insert_message(&message).await?;

        let frame = MessageFrame::from_profile(message.content.clone(), &sender);
        let delivered = self.broadcaster.broadcast(room_id, &frame);
        tracing::debug!(%room_id, message_id = %message.id, delivered, "message sent");

        Ok(Delivered {
            message_id: message.id,
            room_id,
            recipient,
            title: notification_title(&sender),
            body: message.content,
        })
    }

    /// Failures are logged; the message is already stored and broadcast.
    pub async fn notify_recipient(&self, sent: &Delivered) {
        if let Err(err) = self
            .notifier
            .notify_once(sent.recipient, &sent.title, &sent.body)
            .await
        {
            tracing::warn!(
                room_id = %sent.room_id,
                recipient = %sent.recipient,
                error = %err,
                "notification failed, message kept"
            );
        }
    }

    pub async fn get_messages(
        &self,
        room_id: RoomId,
        requester: UserId,
    ) -> ChatResult<RoomMessages> {
        let room = self.room_for(room_id, requester).await?;
        let peer_id = room.peer_of(requester).ok_or(ChatError::Forbidden)?;
        let peer = self.profile(peer_id).await?;

        let messages = self
            .store
            .list_messages(room_id)
            .await?
            .into_iter()
            .map(|(message, sender)| MessageFrame::from_profile(message.content, &sender))
            .collect();

        Ok(RoomMessages {
            id: room.id,
            name: peer.name,
            profile_picture: peer.profile_picture,
            messages,
        })
    }

    pub async fn get_rooms(&self, requester: UserId) -> ChatResult<Vec<RoomSummary>> {
        let peers = self.store.list_room_peers(requester).await?;
        Ok(peers.into_iter().map(RoomSummary::from).collect())
    }
}
