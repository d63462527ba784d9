use crate::{broker::MessageBroker, config::Config};
use sqlx::PgPool;
use std::sync::Arc;

/// Shared application state handed to every resolver through the schema
/// context.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub broker: MessageBroker,
    pub config: Arc<Config>,
}
