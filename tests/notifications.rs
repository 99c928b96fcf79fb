mod common;

use std::sync::Arc;

use common::Fixture;
use pairchat::{
    error::ChatError,
    models::NotificationId,
    services::{NotificationDeduplicator, NotifyOutcome},
};

#[tokio::test]
async fn many_sends_in_a_day_notify_once() {
    let fx = Fixture::new().await;
    let a = fx.user("A").await;
    let b = fx.user("B").await;
    let room = fx.chat.resolve_room(a, b).await.unwrap();

    for i in 0..5 {
        fx.chat.send_message(room, b, format!("ping {i}")).await.unwrap();
    }

    let inbox = fx.chat.list_notifications(a).await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].message, "ping 0");
}

#[tokio::test]
async fn a_new_day_opens_a_new_window() {
    let fx = Fixture::new().await;
    let a = fx.user("A").await;
    let b = fx.user("B").await;
    let room = fx.chat.resolve_room(a, b).await.unwrap();

    fx.chat.send_message(room, b, "today".into()).await.unwrap();
    fx.clock.advance(time::Duration::days(1));
    fx.chat.send_message(room, b, "tomorrow".into()).await.unwrap();

    let inbox = fx.chat.list_notifications(a).await.unwrap();
    let bodies: Vec<_> = inbox.iter().map(|n| n.message.as_str()).collect();
    assert_eq!(bodies, ["tomorrow", "today"]);
}

#[tokio::test]
async fn each_sender_has_its_own_window() {
    let fx = Fixture::new().await;
    let a = fx.user("A").await;
    let b = fx.user("B").await;
    let c = fx.user("C").await;
    let ab = fx.chat.resolve_room(a, b).await.unwrap();
    let ac = fx.chat.resolve_room(a, c).await.unwrap();

    fx.chat.send_message(ab, b, "from b".into()).await.unwrap();
    fx.chat.send_message(ac, c, "from c".into()).await.unwrap();
    fx.chat.send_message(ab, a, "reply".into()).await.unwrap();

    assert_eq!(fx.chat.list_notifications(a).await.unwrap().len(), 2);
    assert_eq!(fx.chat.list_notifications(b).await.unwrap().len(), 1);
}

#[tokio::test]
async fn deduplicator_reports_what_it_did() {
    let fx = Fixture::new().await;
    let a = fx.user("A").await;
    let dedup = NotificationDeduplicator::new(Arc::new(fx.store.clone()), fx.clock.clone());

    let first = dedup.notify_once(a, "New message from B", "one").await.unwrap();
    let second = dedup.notify_once(a, "New message from B", "two").await.unwrap();
    let other = dedup.notify_once(a, "New message from C", "three").await.unwrap();

    assert_eq!(first, NotifyOutcome::Created);
    assert_eq!(second, NotifyOutcome::Suppressed);
    assert_eq!(other, NotifyOutcome::Created);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_notifies_leave_one_row() {
    let fx = Fixture::new().await;
    let a = fx.user("A").await;
    let dedup = NotificationDeduplicator::new(Arc::new(fx.store.clone()), fx.clock.clone());

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let dedup = dedup.clone();
            tokio::spawn(async move {
                dedup
                    .notify_once(a, "New message from B", &format!("burst {i}"))
                    .await
            })
        })
        .collect();

    let mut created = 0;
    for task in tasks {
        if task.await.unwrap().unwrap() == NotifyOutcome::Created {
            created += 1;
        }
    }

    assert_eq!(created, 1);
    assert_eq!(fx.count("notifications").await, 1);
}

#[tokio::test]
async fn only_the_recipient_can_mark_read() {
    let fx = Fixture::new().await;
    let a = fx.user("A").await;
    let b = fx.user("B").await;
    let room = fx.chat.resolve_room(a, b).await.unwrap();
    fx.chat.send_message(room, b, "hi".into()).await.unwrap();
    let id = fx.chat.list_notifications(a).await.unwrap()[0].id;

    let err = fx.chat.mark_notification_read(id, b).await.unwrap_err();
    assert_eq!(err, ChatError::NotFound("notification"));
    assert!(!fx.chat.list_notifications(a).await.unwrap()[0].is_read);

    fx.chat.mark_notification_read(id, a).await.unwrap();
    assert!(fx.chat.list_notifications(a).await.unwrap()[0].is_read);
}

#[tokio::test]
async fn unknown_notification_is_not_found() {
    let fx = Fixture::new().await;
    let a = fx.user("A").await;

    let err = fx
        .chat
        .mark_notification_read(NotificationId::new(), a)
        .await
        .unwrap_err();

    assert_eq!(err, ChatError::NotFound("notification"));
}
