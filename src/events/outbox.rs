use std::sync::Arc;
use std::time::Duration;

use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, warn};

use super::{DomainEvent, EventPublisher};
use crate::config;

/// Insert a domain event into the outbox within the caller's transaction.
/// The event becomes visible to the dispatcher only once the surrounding
/// state change commits.
pub async fn enqueue(
    tx: &mut Transaction<'_, Postgres>,
    event: &DomainEvent,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO outbox (event) VALUES ($1)")
        .bind(sqlx::types::Json(event))
        .execute(&mut **tx)
        .await?;
    Ok(())
}

#[derive(sqlx::FromRow)]
struct OutboxRow {
    id: i64,
    event: sqlx::types::Json<serde_json::Value>,
}

/// Background poller draining the outbox to the room hub.
///
/// Rows are marked dispatched only after every target room has been
/// published to, so a crash mid-batch re-delivers on the next poll:
/// at-least-once, never silent loss.
pub struct OutboxDispatcher {
    pool: PgPool,
    publisher: Arc<dyn EventPublisher>,
}

impl OutboxDispatcher {
    pub fn new(pool: PgPool, publisher: Arc<dyn EventPublisher>) -> Self {
        Self { pool, publisher }
    }

    /// Spawn the polling loop. Runs until the process exits.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        let interval = Duration::from_millis(config::config().events.outbox_poll_interval_ms);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if let Err(e) = self.drain().await {
                    warn!("outbox drain failed: {}", e);
                }
            }
        })
    }

    /// Publish every pending event, oldest first. Returns the number of rows
    /// dispatched.
    pub async fn drain(&self) -> Result<usize, sqlx::Error> {
        let batch_size = config::config().events.outbox_batch_size;
        let rows: Vec<OutboxRow> = sqlx::query_as(
            "SELECT id, event FROM outbox WHERE dispatched_at IS NULL ORDER BY id LIMIT $1",
        )
        .bind(batch_size)
        .fetch_all(&self.pool)
        .await?;

        let mut dispatched = 0;
        for row in rows {
            match serde_json::from_value::<DomainEvent>(row.event.0.clone()) {
                Ok(event) => {
                    publish_to_rooms(self.publisher.as_ref(), &event).await;
                    debug!("dispatched outbox event {} ({})", row.id, event.name());
                }
                Err(e) => {
                    // Unreadable rows are retired rather than wedging the queue.
                    warn!("skipping undecodable outbox event {}: {}", row.id, e);
                }
            }

            sqlx::query("UPDATE outbox SET dispatched_at = now() WHERE id = $1")
                .bind(row.id)
                .execute(&self.pool)
                .await?;
            dispatched += 1;
        }

        Ok(dispatched)
    }
}

/// Push one event to each of its rooms. Publish failures are the
/// publisher's to log; the write that produced the event has already
/// committed and is never rolled back here.
pub async fn publish_to_rooms(publisher: &dyn EventPublisher, event: &DomainEvent) {
    let payload = match serde_json::to_string(event) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("failed to serialize event {}: {}", event.name(), e);
            return;
        }
    };

    for room in event.rooms() {
        publisher.publish(&room.to_string(), &payload).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Location;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct RecordingPublisher {
        published: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl EventPublisher for RecordingPublisher {
        async fn publish(&self, room: &str, payload: &str) {
            self.published
                .lock()
                .unwrap()
                .push((room.to_string(), payload.to_string()));
        }
    }

    #[tokio::test]
    async fn publishes_once_per_room() {
        let publisher = RecordingPublisher::default();
        let event = DomainEvent::DiscussionCreated {
            discussion_id: Uuid::new_v4(),
            title: "Road repairs".into(),
            location: Location::new("Kigali", "Gasabo", "Remera"),
        };

        publish_to_rooms(&publisher, &event).await;

        let published = publisher.published.lock().unwrap();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].0, "sector-Remera");
        assert_eq!(published[1].0, "district-Gasabo");

        // The payload carries the tagged event for clients
        let body: serde_json::Value = serde_json::from_str(&published[0].1).unwrap();
        assert_eq!(body["type"], "discussion_created");
        assert_eq!(body["title"], "Road repairs");
    }
}
