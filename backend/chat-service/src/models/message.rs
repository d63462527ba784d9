use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: Uuid,
    /// None for orphaned messages whose chat was deleted.
    pub chat_id: Option<Uuid>,
    pub sender_id: Uuid,
    pub text: String,
    pub created: DateTime<Utc>,
    pub deleted: bool,
    pub read: bool,
}
