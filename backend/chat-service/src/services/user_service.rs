//! User lookups for the chat surface. Registration and credentials are
//! handled by the external identity layer.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::User;

pub struct UserService;

impl UserService {
    pub async fn find_by_id(db: &PgPool, user_id: Uuid) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, email, first_name, last_name, created_at \
             FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, email, first_name, last_name, created_at \
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {email}")))
    }

    /// Resolve every email to a user; any miss fails the whole call.
    pub async fn resolve_emails(db: &PgPool, emails: &[String]) -> AppResult<Vec<User>> {
        let mut users = Vec::with_capacity(emails.len());
        for email in emails {
            users.push(Self::find_by_email(db, email).await?);
        }
        Ok(users)
    }
}

/// Split a comma-separated email list, trimming entries and dropping
/// duplicates. Empty entries are a caller error.
pub fn parse_email_list(raw: &str) -> AppResult<Vec<String>> {
    let mut emails: Vec<String> = Vec::new();
    for part in raw.split(',') {
        let email = part.trim();
        if email.is_empty() {
            return Err(AppError::BadRequest("empty email in participant list".into()));
        }
        if !emails.iter().any(|e| e == email) {
            emails.push(email.to_string());
        }
    }
    Ok(emails)
}
