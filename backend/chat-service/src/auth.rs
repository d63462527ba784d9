//! JWT authentication.
//!
//! HTTP requests carry a `Authorization: Bearer <token>` header; the
//! claims are injected into the GraphQL request data by the handler.
//! WebSocket connections authenticate once at handshake time: the
//! `connection_init` payload carries the token and the resolved claims
//! are attached to the connection's context for the lifetime of the
//! socket.

use async_graphql::{Context, Data};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // Subject (user ID)
    pub exp: usize,  // Expiration time
    pub iat: usize,  // Issued at
    pub email: String,
}

impl Claims {
    pub fn new(user_id: Uuid, email: &str, ttl_seconds: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            exp: (now + ttl_seconds) as usize,
            iat: now as usize,
            email: email.to_string(),
        }
    }

    pub fn user_id(&self) -> AppResult<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::Unauthorized)
    }
}

pub fn encode_token(claims: &Claims, secret: &str) -> AppResult<String> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AppError::Internal)
}

pub fn decode_token(token: &str, secret: &str) -> AppResult<Claims> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized)
}

/// Strip the Bearer scheme from an Authorization value. A raw token is
/// accepted as-is since WebSocket clients commonly send it unprefixed.
pub fn bearer_token(value: &str) -> &str {
    value.strip_prefix("Bearer ").unwrap_or(value).trim()
}

/// Verify the caller is authenticated and return their user id.
pub fn require_auth(ctx: &Context<'_>) -> AppResult<Uuid> {
    let claims = ctx.data_opt::<Claims>().ok_or(AppError::Unauthorized)?;
    claims.user_id()
}

/// `connection_init` handshake: resolve the token from the payload and
/// attach the claims to the connection scope.
///
/// Accepted payload shapes: `{"token": "..."}` or
/// `{"Authorization": "Bearer ..."}`.
pub fn connection_init_data(payload: serde_json::Value, secret: &str) -> async_graphql::Result<Data> {
    let token = payload
        .get("token")
        .or_else(|| payload.get("Authorization"))
        .and_then(|v| v.as_str())
        .ok_or_else(|| async_graphql::Error::new("connection_init payload missing token"))?;

    let claims = decode_token(bearer_token(token), secret)
        .map_err(|_| async_graphql::Error::new("invalid token"))?;

    let mut data = Data::default();
    data.insert(claims);
    Ok(data)
}
