use async_graphql::ErrorExtensions;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("server start failure: {0}")]
    StartServer(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal server error")]
    Internal,
}

impl AppError {
    /// Stable machine-readable code surfaced in the GraphQL error extensions.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::Forbidden => "FORBIDDEN",
            AppError::NotFound(_) | AppError::Database(sqlx::Error::RowNotFound) => "NOT_FOUND",
            AppError::Config(_)
            | AppError::StartServer(_)
            | AppError::Database(_)
            | AppError::Internal => "INTERNAL",
        }
    }
}

impl ErrorExtensions for AppError {
    fn extend(&self) -> async_graphql::Error {
        let code = self.code();
        // Database failures keep their detail in the server log, not the client.
        let message = match self {
            AppError::Database(sqlx::Error::RowNotFound) => "not found".to_string(),
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error in resolver");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        async_graphql::Error::new(message).extend_with(|_, ext| ext.set("code", code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::BadRequest("x".into()).code(), "BAD_REQUEST");
        assert_eq!(AppError::Unauthorized.code(), "UNAUTHORIZED");
        assert_eq!(AppError::NotFound("chat".into()).code(), "NOT_FOUND");
        assert_eq!(AppError::Internal.code(), "INTERNAL");
    }

    fn extension_code(gql: &async_graphql::Error) -> Option<async_graphql::Value> {
        gql.extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .cloned()
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err = AppError::Database(sqlx::Error::RowNotFound);
        assert_eq!(err.code(), "NOT_FOUND");

        let gql = err.extend();
        assert_eq!(gql.message, "not found");
        assert_eq!(
            extension_code(&gql),
            Some(async_graphql::Value::from("NOT_FOUND"))
        );
    }

    #[test]
    fn test_database_detail_not_leaked() {
        let err = AppError::Database(sqlx::Error::PoolTimedOut);
        let gql = err.extend();
        assert_eq!(gql.message, "internal server error");
        assert_eq!(
            extension_code(&gql),
            Some(async_graphql::Value::from("INTERNAL"))
        );
    }

    #[test]
    fn test_extend_carries_code_extension() {
        let gql = AppError::Unauthorized.extend();
        assert_eq!(
            extension_code(&gql),
            Some(async_graphql::Value::from("UNAUTHORIZED"))
        );
    }
}
