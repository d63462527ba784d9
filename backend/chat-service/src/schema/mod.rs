//! GraphQL schema: chat queries/mutations plus the live message
//! subscription.

pub mod chat;
pub mod message;
pub mod subscription;
pub mod user;

use async_graphql::{MergedObject, Schema};

use crate::state::AppState;

/// Root query object
#[derive(MergedObject, Default)]
pub struct QueryRoot(chat::ChatQuery);

/// Root mutation object
#[derive(MergedObject, Default)]
pub struct MutationRoot(chat::ChatMutation, message::MessageMutation);

/// App schema type with WebSocket subscriptions
pub type AppSchema = Schema<QueryRoot, MutationRoot, subscription::SubscriptionRoot>;

pub fn build_schema(state: AppState) -> AppSchema {
    Schema::build(
        QueryRoot::default(),
        MutationRoot::default(),
        subscription::SubscriptionRoot,
    )
    .data(state)
    .finish()
}
