use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{debug, warn};

use crate::config;
use crate::events::EventPublisher;

/// In-process room registry. Each room is a broadcast channel; publishing to
/// a room with no subscribers is a no-op. Delivery is best-effort: slow
/// receivers are lagged out and events are never buffered for clients that
/// are not connected.
pub struct Hub {
    rooms: RwLock<HashMap<String, broadcast::Sender<String>>>,
    buffer: usize,
}

impl Hub {
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            buffer: config::config().events.room_buffer,
        }
    }

    async fn sender(&self, room: &str) -> broadcast::Sender<String> {
        if let Some(tx) = self.rooms.read().await.get(room) {
            return tx.clone();
        }
        let mut rooms = self.rooms.write().await;
        rooms
            .entry(room.to_string())
            .or_insert_with(|| broadcast::channel(self.buffer).0)
            .clone()
    }

    pub async fn publish(&self, room: &str, payload: &str) {
        let tx = self.rooms.read().await.get(room).cloned();
        match tx {
            Some(tx) => match tx.send(payload.to_string()) {
                Ok(count) => debug!("published to {} ({} receivers)", room, count),
                Err(_) => debug!("room {} has no live receivers", room),
            },
            None => debug!("room {} has no subscribers", room),
        }
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for Hub {
    async fn publish(&self, room: &str, payload: &str) {
        Hub::publish(self, room, payload).await;
    }
}

/// One client's merged view of its rooms. Every subscribed room forwards
/// into a single ordered stream; rooms can be joined after attachment
/// (e.g. when the client opens a discussion thread).
pub struct RoomSubscription {
    hub: Arc<Hub>,
    out_tx: mpsc::UnboundedSender<String>,
    pub receiver: mpsc::UnboundedReceiver<String>,
}

impl RoomSubscription {
    pub async fn attach(hub: Arc<Hub>, rooms: &[String]) -> Self {
        let (out_tx, receiver) = mpsc::unbounded_channel();
        let subscription = Self {
            hub,
            out_tx,
            receiver,
        };
        for room in rooms {
            subscription.join(room).await;
        }
        subscription
    }

    pub async fn join(&self, room: &str) {
        let mut rx = self.hub.sender(room).await.subscribe();
        let out = self.out_tx.clone();
        let room = room.to_string();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(payload) => {
                        if out.send(payload).is_err() {
                            // Client went away; drop the forwarder.
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("room {}: receiver lagged, skipped {} events", room, skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_published_payloads() {
        let hub = Arc::new(Hub::new());
        let mut sub = RoomSubscription::attach(hub.clone(), &["user-1".to_string()]).await;

        hub.publish("user-1", "{\"type\":\"ping\"}").await;

        let received = tokio::time::timeout(std::time::Duration::from_secs(1), sub.receiver.recv())
            .await
            .expect("timed out")
            .expect("channel closed");
        assert_eq!(received, "{\"type\":\"ping\"}");
    }

    #[tokio::test]
    async fn publish_to_empty_room_is_noop() {
        let hub = Hub::new();
        // No subscribers anywhere; must not panic or block.
        hub.publish("district-Gasabo", "payload").await;
    }

    #[tokio::test]
    async fn late_join_adds_room_to_stream() {
        let hub = Arc::new(Hub::new());
        let mut sub = RoomSubscription::attach(hub.clone(), &["user-2".to_string()]).await;
        sub.join("discussion-42").await;

        hub.publish("discussion-42", "comment").await;

        let received = tokio::time::timeout(std::time::Duration::from_secs(1), sub.receiver.recv())
            .await
            .expect("timed out")
            .expect("channel closed");
        assert_eq!(received, "comment");
    }

    #[tokio::test]
    async fn rooms_are_isolated() {
        let hub = Arc::new(Hub::new());
        let mut sub = RoomSubscription::attach(hub.clone(), &["user-3".to_string()]).await;

        hub.publish("user-4", "not for you").await;
        hub.publish("user-3", "for you").await;

        let received = tokio::time::timeout(std::time::Duration::from_secs(1), sub.receiver.recv())
            .await
            .expect("timed out")
            .expect("channel closed");
        assert_eq!(received, "for you");
    }
}
