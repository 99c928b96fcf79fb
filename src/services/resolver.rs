use std::sync::Arc;

use crate::{
    db::ChatStore,
    error::{ChatError, ChatResult, StoreError},
    models::{Room, RoomId, UserId},
};

/// Maps an unordered pair of users to their single room.
#[derive(Clone)]
pub struct RoomResolver {
    store: Arc<dyn ChatStore>,
    max_attempts: u32,
}

impl RoomResolver {
    /// `max_attempts` counts lookups; anything below 2 is raised to 2 so a
    /// lost creation race is always followed by one more lookup.
    pub fn new(store: Arc<dyn ChatStore>, max_attempts: u32) -> Self {
        Self {
            store,
            max_attempts: max_attempts.max(2),
        }
    }

    pub async fn resolve_room(&self, a: UserId, b: UserId) -> ChatResult<RoomId> {
        if a == b {
            return Err(ChatError::InvalidRequest("cannot open a room with yourself".into()));
        }
        if self.store.find_user(b).await?.is_none() {
            return Err(ChatError::NotFound("user"));
        }

        for attempt in 1..=self.max_attempts {
            if let Some(room) = self.store.find_room_between(a, b).await? {
                return Ok(room.id);
            }
            if attempt == self.max_attempts {
                break;
            }

            let room = Room::between(a, b);
            match self.store.create_room(&room).await {
                Ok(()) => {
                    tracing::info!(room_id = %room.id, user_a = %a, user_b = %b, "room created");
                    return Ok(room.id);
                }
                Err(StoreError::Conflict) => {
                    tracing::debug!(
                        user_a = %a,
                        user_b = %b,
                        attempt,
                        "room creation lost a race, looking up again"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }

        tracing::warn!(user_a = %a, user_b = %b, "room lookup kept missing after conflicts");
        Err(ChatError::Upstream("room creation kept conflicting".into()))
    }
}
