use actix_cors::Cors;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use async_graphql::http::{playground_source, GraphQLPlaygroundConfig};
use async_graphql_actix_web::{GraphQLRequest, GraphQLResponse, GraphQLSubscription};
use std::sync::Arc;
use tracing::info;
use tracing_actix_web::TracingLogger;

use chat_service::schema::{build_schema, AppSchema};
use chat_service::{auth, config, db, logging, AppState, MessageBroker};

async fn graphql_handler(
    schema: web::Data<AppSchema>,
    config: web::Data<Arc<config::Config>>,
    http_req: HttpRequest,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let mut request = req.into_inner();

    // Bearer claims ride into the resolver context; requests without a
    // valid token still execute and fail per-field with UNAUTHORIZED.
    if let Some(value) = http_req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
    {
        if let Ok(claims) = auth::decode_token(auth::bearer_token(value), &config.jwt.secret) {
            request = request.data(claims);
        }
    }

    schema.execute(request).await.into()
}

async fn graphql_subscription_handler(
    schema: web::Data<AppSchema>,
    config: web::Data<Arc<config::Config>>,
    req: HttpRequest,
    payload: web::Payload,
) -> actix_web::Result<HttpResponse> {
    let secret = config.jwt.secret.clone();
    GraphQLSubscription::new(schema.as_ref().clone())
        .on_connection_init(move |value| {
            let secret = secret.clone();
            async move { auth::connection_init_data(value, &secret) }
        })
        .start(&req, payload)
}

async fn health_handler() -> &'static str {
    "ok"
}

/// SDL endpoint for schema introspection and client code generation.
async fn schema_handler(schema: web::Data<AppSchema>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain")
        .body(schema.sdl())
}

async fn playground_handler() -> HttpResponse {
    HttpResponse::Ok().content_type("text/html").body(playground_source(
        GraphQLPlaygroundConfig::new("/graphql").subscription_endpoint("/graphql"),
    ))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    logging::init_tracing();

    info!("Starting chat service...");

    let config = Arc::new(
        config::Config::from_env()
            .map_err(|e| std::io::Error::other(format!("failed to load configuration: {e}")))?,
    );

    let pool = db::init_pool(&config.database.url, config.database.max_connections)
        .await
        .map_err(|e| std::io::Error::other(format!("database connection failed: {e}")))?;

    // Embedded migrations are idempotent; a schema drift is fatal.
    db::MIGRATOR
        .run(&pool)
        .await
        .map_err(|e| std::io::Error::other(format!("database migrations failed: {e}")))?;

    let state = AppState {
        db: pool,
        broker: MessageBroker::new(),
        config: config.clone(),
    };
    let schema = build_schema(state);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Chat service listening on http://{}", bind_addr);

    let workers = config.server.workers;
    let playground = config.graphql.playground;
    HttpServer::new(move || {
        let app = App::new()
            .wrap(TracingLogger::default())
            .wrap(Cors::permissive())
            .app_data(web::Data::new(schema.clone()))
            .app_data(web::Data::new(config.clone()))
            .route("/graphql", web::post().to(graphql_handler))
            // WebSocket subscriptions with one-time handshake auth
            .route("/graphql", web::get().to(graphql_subscription_handler))
            .route("/ws", web::get().to(graphql_subscription_handler))
            .route("/graphql/schema", web::get().to(schema_handler))
            .route("/health", web::get().to(health_handler));
        if playground {
            app.route("/playground", web::get().to(playground_handler))
        } else {
            app
        }
    })
    .workers(workers)
    .bind(&bind_addr)?
    .run()
    .await
}
