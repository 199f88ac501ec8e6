use sqlx::PgPool;
use uuid::Uuid;

use super::{validation, ServiceError};
use crate::database::models::{Message, User};
use crate::events::{outbox, DomainEvent};

const MESSAGE_COLUMNS: &str = "id, sender_id, receiver_id, body, status, created_at, read_at";

pub struct MessageService {
    pool: PgPool,
}

impl MessageService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Send a direct message and notify the receiver's room.
    pub async fn send(
        &self,
        actor: &User,
        receiver_id: Uuid,
        body: &str,
    ) -> Result<Message, ServiceError> {
        validation::validate_length("Message", body, 1, 2000).map_err(ServiceError::Validation)?;

        if receiver_id == actor.id {
            return Err(ServiceError::BadRequest(
                "Cannot send a message to yourself".to_string(),
            ));
        }

        let exists: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE id = $1")
            .bind(receiver_id)
            .fetch_one(&self.pool)
            .await?;
        if exists.0 == 0 {
            return Err(ServiceError::NotFound("Recipient not found".to_string()));
        }

        let mut tx = self.pool.begin().await?;

        let message: Message = sqlx::query_as(&format!(
            "INSERT INTO messages (sender_id, receiver_id, body) \
             VALUES ($1, $2, $3) RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(actor.id)
        .bind(receiver_id)
        .bind(body.trim())
        .fetch_one(&mut *tx)
        .await?;

        outbox::enqueue(
            &mut tx,
            &DomainEvent::MessageSent {
                message_id: message.id,
                sender_id: message.sender_id,
                receiver_id: message.receiver_id,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(message)
    }

    /// Both directions of the conversation between the caller and `other`,
    /// oldest first.
    pub async fn conversation(
        &self,
        actor: &User,
        other_id: Uuid,
    ) -> Result<Vec<Message>, ServiceError> {
        let messages: Vec<Message> = sqlx::query_as(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages \
             WHERE (sender_id = $1 AND receiver_id = $2) \
                OR (sender_id = $2 AND receiver_id = $1) \
             ORDER BY created_at ASC"
        ))
        .bind(actor.id)
        .bind(other_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }

    /// Mark a received message read. Receiver-only; idempotent.
    pub async fn mark_read(&self, actor: &User, message_id: Uuid) -> Result<Message, ServiceError> {
        let message: Option<Message> = sqlx::query_as(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1"
        ))
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await?;

        let message =
            message.ok_or_else(|| ServiceError::NotFound("Message not found".to_string()))?;

        if message.receiver_id != actor.id {
            return Err(ServiceError::Forbidden(
                "Only the recipient can mark a message read".to_string(),
            ));
        }

        let message: Message = sqlx::query_as(&format!(
            "UPDATE messages SET status = 'read', read_at = COALESCE(read_at, now()) \
             WHERE id = $1 RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(message.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(message)
    }
}
