use axum::http::StatusCode;
use thiserror::Error;

/// Failure kinds surfaced by the chat services.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Produced only at the auth boundary.
    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("upstream failure: {0}")]
    Upstream(String),

    #[error("request cancelled")]
    Cancelled,
}

pub type ChatResult<T> = Result<T, ChatError>;

impl ChatError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ChatError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ChatError::Unauthorized => StatusCode::UNAUTHORIZED,
            ChatError::Forbidden => StatusCode::FORBIDDEN,
            ChatError::NotFound(_) => StatusCode::NOT_FOUND,
            ChatError::Upstream(_) => StatusCode::BAD_GATEWAY,
            // nginx's "client closed request"
            ChatError::Cancelled => {
                StatusCode::from_u16(499).unwrap_or(StatusCode::REQUEST_TIMEOUT)
            }
        }
    }

    /// Text safe to hand back to a client.
    pub fn public_message(&self) -> String {
        match self {
            ChatError::Upstream(_) => "upstream failure".to_owned(),
            other => other.to_string(),
        }
    }
}

/// Errors raised by a [`crate::db::ChatStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated")]
    Conflict,

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let unique = err
            .as_database_error()
            .is_some_and(|db_err| db_err.is_unique_violation());
        if unique {
            StoreError::Conflict
        } else {
            StoreError::Database(err)
        }
    }
}

impl From<uuid::Error> for StoreError {
    fn from(err: uuid::Error) -> Self {
        StoreError::Corrupt(err.to_string())
    }
}

impl From<StoreError> for ChatError {
    fn from(err: StoreError) -> Self {
        tracing::error!(error = %err, "persistence call failed");
        ChatError::Upstream(err.to_string())
    }
}
