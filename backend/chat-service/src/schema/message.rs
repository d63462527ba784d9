//! Message object type and mutations: send, mark read, soft delete.

use async_graphql::{
    ComplexObject, Context, Object, Result as GraphQLResult, ResultExt, SimpleObject,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::auth::require_auth;
use crate::models::Message;
use crate::schema::user::UserObject;
use crate::services::message_service::MessageService;
use crate::services::user_service::UserService;
use crate::state::AppState;

#[derive(SimpleObject, Clone, Debug)]
#[graphql(name = "Message", complex)]
pub struct MessageObject {
    pub id: Uuid,
    /// Null for orphaned messages whose chat was deleted.
    pub chat_id: Option<Uuid>,
    pub sender_id: Uuid,
    pub text: String,
    pub created: DateTime<Utc>,
    pub deleted: bool,
    pub read: bool,
}

impl From<Message> for MessageObject {
    fn from(message: Message) -> Self {
        MessageObject {
            id: message.id,
            chat_id: message.chat_id,
            sender_id: message.sender_id,
            text: message.text,
            created: message.created,
            deleted: message.deleted,
            read: message.read,
        }
    }
}

#[ComplexObject]
impl MessageObject {
    async fn sender(&self, ctx: &Context<'_>) -> GraphQLResult<UserObject> {
        let state = ctx
            .data::<AppState>()
            .map_err(|_| "application state not available")?;
        let user = UserService::find_by_id(&state.db, self.sender_id)
            .await
            .extend()?;
        Ok(user.into())
    }
}

#[derive(Default)]
pub struct MessageMutation;

#[Object]
impl MessageMutation {
    /// Store a message in a chat the caller participates in, then push
    /// one event to every other participant's live subscriptions.
    async fn send_message(
        &self,
        ctx: &Context<'_>,
        chat_id: Uuid,
        message: String,
    ) -> GraphQLResult<MessageObject> {
        let state = ctx
            .data::<AppState>()
            .map_err(|_| "application state not available")?;
        let sender_id = require_auth(ctx).extend()?;

        let (stored, participants) =
            MessageService::send_message(&state.db, chat_id, sender_id, &message)
                .await
                .extend()?;

        // Fan-out happens after commit so subscribers never observe an
        // uncommitted message. Fire-and-forget: disconnected recipients
        // miss the event.
        state.broker.fan_out(&participants, &stored).await;

        Ok(stored.into())
    }

    /// Mark a message read. Only a participant other than the sender may.
    async fn mark_message_read(
        &self,
        ctx: &Context<'_>,
        message_id: Uuid,
    ) -> GraphQLResult<MessageObject> {
        let state = ctx
            .data::<AppState>()
            .map_err(|_| "application state not available")?;
        let user_id = require_auth(ctx).extend()?;
        let message = MessageService::mark_read(&state.db, user_id, message_id)
            .await
            .extend()?;
        Ok(message.into())
    }

    /// Soft-delete a message. Sender only; the row is kept with the
    /// deleted flag set.
    async fn delete_message(
        &self,
        ctx: &Context<'_>,
        message_id: Uuid,
    ) -> GraphQLResult<MessageObject> {
        let state = ctx
            .data::<AppState>()
            .map_err(|_| "application state not available")?;
        let user_id = require_auth(ctx).extend()?;
        let message = MessageService::soft_delete(&state.db, user_id, message_id)
            .await
            .extend()?;
        Ok(message.into())
    }
}
