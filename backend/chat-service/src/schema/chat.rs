//! Chat object type, queries, and the create-chat mutation.

use async_graphql::{
    ComplexObject, Context, Object, Result as GraphQLResult, ResultExt, SimpleObject,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::auth::require_auth;
use crate::models::Chat;
use crate::schema::message::MessageObject;
use crate::schema::user::UserObject;
use crate::services::chat_service::ChatService;
use crate::services::clamp_page;
use crate::services::message_service::MessageService;
use crate::services::user_service::UserService;
use crate::state::AppState;

#[derive(SimpleObject, Clone, Debug)]
#[graphql(name = "Chat", complex)]
pub struct ChatObject {
    pub id: Uuid,
    pub name: Option<String>,
    pub is_group: bool,
    pub last_modified: DateTime<Utc>,
}

impl From<Chat> for ChatObject {
    fn from(chat: Chat) -> Self {
        ChatObject {
            id: chat.id,
            name: chat.name,
            is_group: chat.is_group,
            last_modified: chat.last_modified,
        }
    }
}

#[ComplexObject]
impl ChatObject {
    /// Participant set, in no particular order.
    async fn participants(&self, ctx: &Context<'_>) -> GraphQLResult<Vec<UserObject>> {
        let state = ctx
            .data::<AppState>()
            .map_err(|_| "application state not available")?;
        let users = ChatService::participants(&state.db, self.id).await.extend()?;
        Ok(users.into_iter().map(UserObject::from).collect())
    }

    /// Messages of this chat, oldest first.
    async fn messages(
        &self,
        ctx: &Context<'_>,
        read: Option<bool>,
        deleted: Option<bool>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> GraphQLResult<Vec<MessageObject>> {
        let state = ctx
            .data::<AppState>()
            .map_err(|_| "application state not available")?;
        let (limit, offset) = clamp_page(limit, offset);
        let messages =
            MessageService::list_by_chat(&state.db, self.id, read, deleted, limit, offset)
                .await
                .extend()?;
        Ok(messages.into_iter().map(MessageObject::from).collect())
    }
}

#[derive(Default)]
pub struct ChatQuery;

#[Object]
impl ChatQuery {
    /// The authenticated caller.
    async fn me(&self, ctx: &Context<'_>) -> GraphQLResult<UserObject> {
        let state = ctx
            .data::<AppState>()
            .map_err(|_| "application state not available")?;
        let user_id = require_auth(ctx).extend()?;
        let user = UserService::find_by_id(&state.db, user_id).await.extend()?;
        Ok(user.into())
    }

    /// Chats the caller participates in, most recently modified first.
    async fn chats(
        &self,
        ctx: &Context<'_>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> GraphQLResult<Vec<ChatObject>> {
        let state = ctx
            .data::<AppState>()
            .map_err(|_| "application state not available")?;
        let user_id = require_auth(ctx).extend()?;
        let (limit, offset) = clamp_page(limit, offset);
        let chats = ChatService::list_for_user(&state.db, user_id, limit, offset)
            .await
            .extend()?;
        Ok(chats.into_iter().map(ChatObject::from).collect())
    }

    /// A single chat, only visible to its participants.
    async fn chat(&self, ctx: &Context<'_>, id: Uuid) -> GraphQLResult<ChatObject> {
        let state = ctx
            .data::<AppState>()
            .map_err(|_| "application state not available")?;
        let user_id = require_auth(ctx).extend()?;
        let chat = ChatService::get_for_user(&state.db, user_id, id).await.extend()?;
        Ok(chat.into())
    }

    /// Messages of a chat the caller participates in.
    async fn messages(
        &self,
        ctx: &Context<'_>,
        chat_id: Uuid,
        read: Option<bool>,
        deleted: Option<bool>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> GraphQLResult<Vec<MessageObject>> {
        let state = ctx
            .data::<AppState>()
            .map_err(|_| "application state not available")?;
        let user_id = require_auth(ctx).extend()?;
        let (limit, offset) = clamp_page(limit, offset);
        let messages = MessageService::list_for_chat(
            &state.db, user_id, chat_id, read, deleted, limit, offset,
        )
        .await
        .extend()?;
        Ok(messages.into_iter().map(MessageObject::from).collect())
    }
}

#[derive(Default)]
pub struct ChatMutation;

#[Object]
impl ChatMutation {
    /// Create a chat from a comma-separated list of participant emails.
    /// Without `group`, at most two participants are allowed and an
    /// existing chat with the same pair is returned instead of a new one.
    async fn create_chat(
        &self,
        ctx: &Context<'_>,
        emails: String,
        name: Option<String>,
        group: Option<bool>,
    ) -> GraphQLResult<ChatObject> {
        let state = ctx
            .data::<AppState>()
            .map_err(|_| "application state not available")?;
        require_auth(ctx).extend()?;
        let chat = ChatService::create_chat(&state.db, &emails, name, group.unwrap_or(false))
            .await
            .extend()?;
        Ok(chat.into())
    }
}
