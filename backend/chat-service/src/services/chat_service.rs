//! Chat creation and participation-scoped access.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Chat, User};
use crate::services::user_service::{parse_email_list, UserService};

pub struct ChatService;

impl ChatService {
    /// Create a chat from a comma-separated participant email list.
    ///
    /// A non-group chat is limited to two participants, checked here and
    /// only here. A non-group chat whose participant set already exists
    /// returns the existing chat instead of creating a second one.
    pub async fn create_chat(
        db: &PgPool,
        emails: &str,
        name: Option<String>,
        group: bool,
    ) -> AppResult<Chat> {
        let emails = parse_email_list(emails)?;
        if !group && emails.len() > 2 {
            return Err(AppError::BadRequest(
                "a chat that is not a group cannot have more than two participants".into(),
            ));
        }

        let users = UserService::resolve_emails(db, &emails).await?;
        let participant_ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();

        if !group {
            if let Some(existing) = Self::find_direct_chat(db, &participant_ids).await? {
                tracing::debug!(chat_id = %existing.id, "returning existing direct chat");
                return Ok(existing);
            }
        }

        // The name only applies to groups; direct chats are anonymous.
        let name = if group { name } else { None };

        let mut tx = db.begin().await?;

        let chat = sqlx::query_as::<_, Chat>(
            "INSERT INTO chats (name, is_group) VALUES ($1, $2) \
             RETURNING id, name, is_group, last_modified",
        )
        .bind(&name)
        .bind(group)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO chat_participants (chat_id, user_id) SELECT $1, unnest($2::uuid[])",
        )
        .bind(chat.id)
        .bind(&participant_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(chat_id = %chat.id, participants = participant_ids.len(), group, "chat created");
        Ok(chat)
    }

    /// Existing non-group chat with exactly this participant set, if any.
    async fn find_direct_chat(db: &PgPool, participant_ids: &[Uuid]) -> AppResult<Option<Chat>> {
        let chat = sqlx::query_as::<_, Chat>(
            "SELECT c.id, c.name, c.is_group, c.last_modified \
             FROM chats c \
             WHERE c.is_group = false \
               AND NOT EXISTS ( \
                   SELECT 1 FROM chat_participants p \
                   WHERE p.chat_id = c.id AND NOT (p.user_id = ANY($1)) \
               ) \
               AND (SELECT count(*) FROM chat_participants p WHERE p.chat_id = c.id) = $2 \
             LIMIT 1",
        )
        .bind(participant_ids)
        .bind(participant_ids.len() as i64)
        .fetch_optional(db)
        .await?;
        Ok(chat)
    }

    /// Chats the user participates in, most recently modified first.
    pub async fn list_for_user(
        db: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Chat>> {
        let chats = sqlx::query_as::<_, Chat>(
            "SELECT c.id, c.name, c.is_group, c.last_modified \
             FROM chats c \
             JOIN chat_participants p ON p.chat_id = c.id \
             WHERE p.user_id = $1 \
             ORDER BY c.last_modified DESC \
             LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(chats)
    }

    /// Single chat, scoped to the caller being a participant. A chat the
    /// caller is not part of is indistinguishable from one that does not
    /// exist.
    pub async fn get_for_user(db: &PgPool, user_id: Uuid, chat_id: Uuid) -> AppResult<Chat> {
        sqlx::query_as::<_, Chat>(
            "SELECT c.id, c.name, c.is_group, c.last_modified \
             FROM chats c \
             JOIN chat_participants p ON p.chat_id = c.id \
             WHERE c.id = $1 AND p.user_id = $2",
        )
        .bind(chat_id)
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("chat {chat_id}")))
    }

    pub async fn participants(db: &PgPool, chat_id: Uuid) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT u.id, u.username, u.email, u.first_name, u.last_name, u.created_at \
             FROM users u \
             JOIN chat_participants p ON p.user_id = u.id \
             WHERE p.chat_id = $1",
        )
        .bind(chat_id)
        .fetch_all(db)
        .await?;
        Ok(users)
    }

    pub async fn participant_ids(db: &PgPool, chat_id: Uuid) -> AppResult<Vec<Uuid>> {
        let rows: Vec<(Uuid,)> =
            sqlx::query_as("SELECT user_id FROM chat_participants WHERE chat_id = $1")
                .bind(chat_id)
                .fetch_all(db)
                .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
