use std::sync::Arc;

use time::OffsetDateTime;

use crate::{
    db::{ChatStore, StoreResult},
    models::{MESSAGE_NOTIFICATION, Notification, NotificationId, UserId},
};

/// Source of "now" for day-bucketed decisions. Days are UTC.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    Created,
    Suppressed,
}

/// At most one notification per (recipient, title, UTC day).
///
/// The existence check and the insert run as a single conditional insert, so
/// concurrent sends cannot both pass the check.
#[derive(Clone)]
pub struct NotificationDeduplicator {
    store: Arc<dyn ChatStore>,
    clock: Arc<dyn Clock>,
}

impl NotificationDeduplicator {
    pub fn new(store: Arc<dyn ChatStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn notify_once(
        &self,
        recipient_id: UserId,
        title: &str,
        body: &str,
    ) -> StoreResult<NotifyOutcome> {
        let notification = Notification {
            id: NotificationId::new(),
            recipient_id,
            title: title.to_owned(),
            message: body.to_owned(),
            notification_type: MESSAGE_NOTIFICATION.to_owned(),
            is_read: false,
            created_at: self.clock.now(),
        };

        if self.store.insert_notification_once(&notification).await? {
            tracing::debug!(%recipient_id, title, "notification created");
            Ok(NotifyOutcome::Created)
        } else {
            Ok(NotifyOutcome::Suppressed)
        }
    }
}
