//! In-process fan-out broker.
//!
//! Routes new-message events to the live subscriptions of each recipient.
//! Delivery is fire-and-forget: a recipient with no live connection at
//! publish time receives nothing (at-most-once, best-effort). Each user
//! may hold multiple concurrent connections; every one of them gets the
//! event.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{
    mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    RwLock,
};
use uuid::Uuid;

use crate::models::Message;

/// Unique identifier for a live subscription, used for precise cleanup
/// when the connection closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

struct Subscriber {
    id: SubscriberId,
    sender: UnboundedSender<Message>,
}

/// Registry of live subscriptions keyed by recipient user id.
#[derive(Default, Clone)]
pub struct MessageBroker {
    inner: Arc<RwLock<HashMap<Uuid, Vec<Subscriber>>>>,
}

/// Recipient set for a message: every participant except the sender.
pub fn recipients(participants: &[Uuid], sender_id: Uuid) -> Vec<Uuid> {
    participants
        .iter()
        .copied()
        .filter(|id| *id != sender_id)
        .collect()
}

impl MessageBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live subscription for `user_id`.
    pub async fn subscribe(&self, user_id: Uuid) -> (SubscriberId, UnboundedReceiver<Message>) {
        let (tx, rx) = unbounded_channel();
        let subscriber_id = SubscriberId::new();

        let mut guard = self.inner.write().await;
        guard.entry(user_id).or_default().push(Subscriber {
            id: subscriber_id,
            sender: tx,
        });

        tracing::debug!(
            %user_id,
            subscribers = guard.get(&user_id).map(|v| v.len()).unwrap_or(0),
            "subscriber added"
        );

        (subscriber_id, rx)
    }

    /// Remove one subscription. Must be called when the stream is dropped,
    /// otherwise the sender side leaks.
    pub async fn unsubscribe(&self, user_id: Uuid, subscriber_id: SubscriberId) {
        let mut guard = self.inner.write().await;
        if let Some(subscribers) = guard.get_mut(&user_id) {
            subscribers.retain(|s| s.id != subscriber_id);
            if subscribers.is_empty() {
                guard.remove(&user_id);
            }
        }
    }

    /// Non-blocking removal for drop paths with no runtime at hand. If
    /// the lock is contended the stale entry holds a closed sender and
    /// is pruned on the next publish.
    pub fn unsubscribe_now(&self, user_id: Uuid, subscriber_id: SubscriberId) {
        if let Ok(mut guard) = self.inner.try_write() {
            if let Some(subscribers) = guard.get_mut(&user_id) {
                subscribers.retain(|s| s.id != subscriber_id);
                if subscribers.is_empty() {
                    guard.remove(&user_id);
                }
            }
        }
    }

    /// Push an event to every live connection of `user_id`. Dead senders
    /// are pruned in place; publishing to a user with no connections is a
    /// no-op.
    pub async fn publish(&self, user_id: Uuid, message: &Message) {
        let mut guard = self.inner.write().await;
        if let Some(subscribers) = guard.get_mut(&user_id) {
            subscribers.retain(|s| s.sender.send(message.clone()).is_ok());
            if subscribers.is_empty() {
                guard.remove(&user_id);
            }
        }
    }

    /// Deliver one event per participant other than the sender.
    pub async fn fan_out(&self, participants: &[Uuid], message: &Message) {
        for recipient in recipients(participants, message.sender_id) {
            self.publish(recipient, message).await;
        }
    }

    /// Live connection count for a user.
    pub async fn subscriber_count(&self, user_id: Uuid) -> usize {
        let guard = self.inner.read().await;
        guard.get(&user_id).map(|v| v.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_message(chat_id: Uuid, sender_id: Uuid, text: &str) -> Message {
        Message {
            id: Uuid::new_v4(),
            chat_id: Some(chat_id),
            sender_id,
            text: text.to_string(),
            created: Utc::now(),
            deleted: false,
            read: false,
        }
    }

    #[test]
    fn test_recipients_excludes_sender() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        let to = recipients(&[a, b, c], a);
        assert_eq!(to.len(), 2);
        assert!(to.contains(&b));
        assert!(to.contains(&c));
        assert!(!to.contains(&a));
    }

    #[test]
    fn test_recipients_sender_only_chat() {
        let a = Uuid::new_v4();
        assert!(recipients(&[a], a).is_empty());
    }

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let broker = MessageBroker::new();
        let user = Uuid::new_v4();
        let (_id, mut rx) = broker.subscribe(user).await;

        let msg = test_message(Uuid::new_v4(), Uuid::new_v4(), "hi");
        broker.publish(user, &msg).await;

        let received = rx.recv().await.unwrap();
        assert_eq!(received.id, msg.id);
        assert_eq!(received.text, "hi");
    }

    #[tokio::test]
    async fn test_publish_to_disconnected_user_is_noop() {
        let broker = MessageBroker::new();
        let msg = test_message(Uuid::new_v4(), Uuid::new_v4(), "lost");
        // No subscribers: the event is dropped without error.
        broker.publish(Uuid::new_v4(), &msg).await;
    }

    #[tokio::test]
    async fn test_fan_out_one_event_per_recipient() {
        let broker = MessageBroker::new();
        let sender = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        let (_ids, mut rx_sender) = broker.subscribe(sender).await;
        let (_idb, mut rx_b) = broker.subscribe(b).await;
        let (_idc, mut rx_c) = broker.subscribe(c).await;

        let msg = test_message(Uuid::new_v4(), sender, "hello all");
        broker.fan_out(&[sender, b, c], &msg).await;

        assert_eq!(rx_b.recv().await.unwrap().text, "hello all");
        assert_eq!(rx_c.recv().await.unwrap().text, "hello all");
        // Exactly one event each, none for the sender.
        assert!(rx_b.try_recv().is_err());
        assert!(rx_c.try_recv().is_err());
        assert!(rx_sender.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_multiple_connections_same_user() {
        let broker = MessageBroker::new();
        let user = Uuid::new_v4();
        let (_id1, mut rx1) = broker.subscribe(user).await;
        let (_id2, mut rx2) = broker.subscribe(user).await;
        assert_eq!(broker.subscriber_count(user).await, 2);

        let msg = test_message(Uuid::new_v4(), Uuid::new_v4(), "both");
        broker.publish(user, &msg).await;

        assert_eq!(rx1.recv().await.unwrap().text, "both");
        assert_eq!(rx2.recv().await.unwrap().text, "both");
    }

    #[tokio::test]
    async fn test_unsubscribe_removes_connection() {
        let broker = MessageBroker::new();
        let user = Uuid::new_v4();
        let (id, _rx) = broker.subscribe(user).await;
        assert_eq!(broker.subscriber_count(user).await, 1);

        broker.unsubscribe(user, id).await;
        assert_eq!(broker.subscriber_count(user).await, 0);
    }

    #[test]
    fn test_unsubscribe_now_outside_runtime() {
        let runtime = tokio::runtime::Runtime::new().expect("runtime");
        let broker = MessageBroker::new();
        let user = Uuid::new_v4();
        let (id, _rx) = runtime.block_on(broker.subscribe(user));
        assert_eq!(runtime.block_on(broker.subscriber_count(user)), 1);

        // No ambient runtime here; removal must still work without panicking.
        broker.unsubscribe_now(user, id);
        assert_eq!(runtime.block_on(broker.subscriber_count(user)), 0);
    }

    #[tokio::test]
    async fn test_dead_sender_pruned_on_publish() {
        let broker = MessageBroker::new();
        let user = Uuid::new_v4();
        let (_id, rx) = broker.subscribe(user).await;
        drop(rx);

        let msg = test_message(Uuid::new_v4(), Uuid::new_v4(), "gone");
        broker.publish(user, &msg).await;
        assert_eq!(broker.subscriber_count(user).await, 0);
    }
}
