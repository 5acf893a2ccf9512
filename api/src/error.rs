use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use talem_rag::RagError;
use thiserror::Error;

pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized access. Please login.";
pub const LOGIN_FAILED_MESSAGE: &str = "Error in logging process. Try again.";
pub const LOGOUT_FAILED_MESSAGE: &str = "Error in logging out process. Try again.";

/// Failures reported by the session and chat-history backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    InvalidId(String),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("mongodb error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("no session cookie")]
    NoSession,

    #[error("{0}")]
    Backend(String),
}

/// Every way a request can fail, rendered as a JSON body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid JSON")]
    InvalidJson,

    #[error("Query missing")]
    QueryMissing,

    #[error("Messages missing")]
    MessagesMissing,

    #[error("{}", UNAUTHORIZED_MESSAGE)]
    Unauthorized,

    #[error("{}", LOGIN_FAILED_MESSAGE)]
    LoginFailed,

    #[error("{}", LOGOUT_FAILED_MESSAGE)]
    LogoutFailed,

    #[error("Chat message not found or not authorized.")]
    ChatNotFound,

    #[error("Invalid chat_id: {0}")]
    InvalidChatId(String),

    #[error(transparent)]
    Rag(#[from] RagError),

    #[error("internal server error")]
    Store(StoreError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidJson
            | ApiError::QueryMissing
            | ApiError::MessagesMissing
            | ApiError::InvalidChatId(_)
            | ApiError::LogoutFailed => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized | ApiError::LoginFailed => StatusCode::UNAUTHORIZED,
            ApiError::ChatNotFound | ApiError::Rag(RagError::NoRelevantContent) => StatusCode::NOT_FOUND,
            ApiError::Rag(_) => StatusCode::BAD_GATEWAY,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            // Auth failures keep the `response` key the web client reads.
            ApiError::Unauthorized | ApiError::LoginFailed | ApiError::LogoutFailed => {
                json!({ "response": self.to_string() })
            }
            ApiError::Store(e) => {
                log::error!("Store error: {}", e);
                json!({ "error": self.to_string() })
            }
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InvalidId(id) => ApiError::InvalidChatId(id),
            other => ApiError::Store(other),
        }
    }
}
