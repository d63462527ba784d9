//! Message storage and the read/deleted flag mutations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::Message;
use crate::services::chat_service::ChatService;

const MESSAGE_COLUMNS: &str = "id, chat_id, sender_id, text, created, deleted, read";

pub struct MessageService;

impl MessageService {
    /// Store a message in a chat the sender participates in.
    ///
    /// Runs in one transaction: the insert and the chat's last_modified
    /// bump land together. Returns the message plus the chat's
    /// participant ids so the caller can fan out after commit.
    pub async fn send_message(
        db: &PgPool,
        chat_id: Uuid,
        sender_id: Uuid,
        text: &str,
    ) -> AppResult<(Message, Vec<Uuid>)> {
        // Scoped lookup: not found and not-a-participant are the same error.
        ChatService::get_for_user(db, sender_id, chat_id).await?;

        let mut tx = db.begin().await?;

        let message = sqlx::query_as::<_, Message>(
            "INSERT INTO messages (chat_id, sender_id, text) VALUES ($1, $2, $3) \
             RETURNING id, chat_id, sender_id, text, created, deleted, read",
        )
        .bind(chat_id)
        .bind(sender_id)
        .bind(text)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE chats SET last_modified = now() WHERE id = $1")
            .bind(chat_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let participants = ChatService::participant_ids(db, chat_id).await?;

        tracing::info!(
            message_id = %message.id,
            %chat_id,
            recipients = participants.len().saturating_sub(1),
            "message stored"
        );
        Ok((message, participants))
    }

    /// Messages of a chat the caller participates in, oldest first, with
    /// optional read/deleted filters.
    pub async fn list_for_chat(
        db: &PgPool,
        user_id: Uuid,
        chat_id: Uuid,
        read: Option<bool>,
        deleted: Option<bool>,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Message>> {
        ChatService::get_for_user(db, user_id, chat_id).await?;
        Self::list_by_chat(db, chat_id, read, deleted, limit, offset).await
    }

    /// Unscoped listing used by field resolvers that already hold a
    /// participation-scoped chat.
    pub async fn list_by_chat(
        db: &PgPool,
        chat_id: Uuid,
        read: Option<bool>,
        deleted: Option<bool>,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages \
             WHERE chat_id = $1 \
               AND ($2::bool IS NULL OR read = $2) \
               AND ($3::bool IS NULL OR deleted = $3) \
             ORDER BY created ASC \
             LIMIT $4 OFFSET $5"
        ))
        .bind(chat_id)
        .bind(read)
        .bind(deleted)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(messages)
    }

    /// Flip the read flag. Only a participant of the message's chat other
    /// than the sender may mark it read; an orphaned message cannot be.
    pub async fn mark_read(db: &PgPool, user_id: Uuid, message_id: Uuid) -> AppResult<Message> {
        sqlx::query_as::<_, Message>(&format!(
            "UPDATE messages m SET read = true \
             WHERE m.id = $1 \
               AND m.sender_id <> $2 \
               AND m.chat_id IN (SELECT chat_id FROM chat_participants WHERE user_id = $2) \
             RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(message_id)
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("message {message_id}")))
    }

    /// Soft delete: only the sender may delete, and the row stays so the
    /// deleted filter remains meaningful.
    pub async fn soft_delete(db: &PgPool, user_id: Uuid, message_id: Uuid) -> AppResult<Message> {
        sqlx::query_as::<_, Message>(&format!(
            "UPDATE messages SET deleted = true \
             WHERE id = $1 AND sender_id = $2 \
             RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(message_id)
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("message {message_id}")))
    }
}
