//! Schema shape tests: the SDL must expose the full chat surface.

use std::sync::Arc;

use chat_service::config::{Config, DatabaseConfig, GraphQLConfig, JwtConfig, ServerConfig};
use chat_service::schema::build_schema;
use chat_service::{AppState, MessageBroker};

fn test_state() -> AppState {
    let config = Config {
        server: ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            workers: 1,
        },
        database: DatabaseConfig {
            url: "postgres://localhost/chat_test".into(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: "test-secret".into(),
        },
        graphql: GraphQLConfig { playground: false },
    };
    let pool = sqlx::postgres::PgPoolOptions::new()
        .connect_lazy(&config.database.url)
        .expect("lazy pool");
    AppState {
        db: pool,
        broker: MessageBroker::new(),
        config: Arc::new(config),
    }
}

// connect_lazy needs an ambient Tokio runtime even though it never dials.
#[tokio::test]
async fn test_schema_builds_with_full_surface() {
    let schema = build_schema(test_state());
    let sdl = schema.sdl();

    assert!(sdl.contains("type Query"));
    assert!(sdl.contains("type Mutation"));
    assert!(sdl.contains("type Subscription"));

    // Queries
    assert!(sdl.contains("me: User!"));
    assert!(sdl.contains("chats("));
    assert!(sdl.contains("chat(id: UUID!): Chat!"));
    assert!(sdl.contains("messages(chatId: UUID!"));

    // Mutations
    assert!(sdl.contains("createChat("));
    assert!(sdl.contains("sendMessage("));
    assert!(sdl.contains("markMessageRead("));
    assert!(sdl.contains("deleteMessage("));

    // Subscription
    assert!(sdl.contains("onNewMessage("));
}

#[tokio::test]
async fn test_unauthenticated_query_gets_unauthorized() {
    let schema = build_schema(test_state());
    let response = schema.execute("{ me { id } }").await;

    assert!(!response.errors.is_empty());
    let code = response.errors[0]
        .extensions
        .as_ref()
        .and_then(|ext| ext.get("code"))
        .cloned();
    assert_eq!(code, Some(async_graphql::Value::from("UNAUTHORIZED")));
}
