use crate::auth::{precheck, SessionUser};
use crate::cookie::{create_cookie, destroy_cookie};
use crate::error::ApiError;
use crate::query_payload::*;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, State},
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tower_http::cors::{AllowHeaders, CorsLayer};

const SUCCESS: &str = "Success.";

pub fn router(state: AppState, cors_allowed_origins: &[String]) -> Router {
    let protected = Router::new()
        .route("/", get(handle_index_request))
        .route("/chat/", post(handle_chat_request))
        .route(
            "/chat-history/",
            get(handle_chat_history_request)
                .post(handle_save_chat_message)
                .delete(handle_delete_chat_history),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), precheck));

    Router::new()
        .merge(protected)
        .route("/login/", post(handle_login_request))
        .route("/logout/", post(handle_logout_request))
        .layer(cors_layer(cors_allowed_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::HEAD, Method::OPTIONS, Method::DELETE])
        .allow_headers(AllowHeaders::mirror_request())
}

async fn handle_index_request() -> Json<MessageResponse<&'static str>> {
    Json(MessageResponse::new("Talem AI server"))
}

async fn handle_chat_request(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    payload: Result<Json<QueryPayload>, JsonRejection>,
) -> Result<Json<MessageResponse<String>>, ApiError> {
    let Json(payload) = payload.map_err(|_| ApiError::InvalidJson)?;
    let query = payload
        .query
        .filter(|q| !q.trim().is_empty())
        .ok_or(ApiError::QueryMissing)?;

    log::info!("Chat query from {}", user.email);
    let answer = state.rag.answer(&query).await?;
    Ok(Json(MessageResponse::new(answer)))
}

async fn handle_login_request(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginPayload>, JsonRejection>,
) -> Result<(CookieJar, Json<MessageResponse<&'static str>>), ApiError> {
    let token = payload
        .ok()
        .and_then(|Json(p)| p.token)
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::LoginFailed)?;

    match state.sessions.create_session(&token).await {
        Ok(Some(session_id)) => Ok((
            create_cookie(jar, &session_id, state.production),
            Json(MessageResponse::new(SUCCESS)),
        )),
        Ok(None) => Err(ApiError::LoginFailed),
        Err(e) => {
            log::error!("Failed to store session: {}", e);
            Err(ApiError::LoginFailed)
        }
    }
}

async fn handle_logout_request(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse<&'static str>>), ApiError> {
    match state.sessions.destroy_session(&jar).await {
        Ok(()) => Ok((destroy_cookie(jar), Json(MessageResponse::new(SUCCESS)))),
        Err(e) => {
            log::warn!("Logout failed: {}", e);
            Err(ApiError::LogoutFailed)
        }
    }
}

async fn handle_chat_history_request(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<MessageResponse<Vec<crate::chat_history::ChatRecord>>>, ApiError> {
    let records = state.history.list(&user.email).await?;
    Ok(Json(MessageResponse::new(records)))
}

async fn handle_save_chat_message(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    payload: Result<Json<SaveHistoryPayload>, JsonRejection>,
) -> Result<Json<MessageResponse<crate::chat_history::ChatRecord>>, ApiError> {
    let Json(payload) = payload.map_err(|_| ApiError::InvalidJson)?;
    let messages = payload
        .messages
        .filter(|m| !m.is_null())
        .ok_or(ApiError::MessagesMissing)?;

    let saved = state.history.save(&user.email, messages).await?;
    Ok(Json(MessageResponse::new(saved)))
}

/// Deletes one record when `chat_id` is given, the user's whole history when the
/// key is absent. A `null` id matches nothing.
async fn handle_delete_chat_history(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    body: Bytes,
) -> Result<Json<MessageResponse<String>>, ApiError> {
    let payload: DeleteHistoryPayload = if body.iter().all(u8::is_ascii_whitespace) {
        DeleteHistoryPayload::default()
    } else {
        serde_json::from_slice(&body).map_err(|_| ApiError::InvalidJson)?
    };

    match payload.chat_id {
        Some(Some(chat_id)) => {
            if state.history.delete_one(&user.email, &chat_id).await? {
                Ok(Json(MessageResponse::new(format!(
                    "Deleted chat message with id {}.",
                    chat_id
                ))))
            } else {
                Err(ApiError::ChatNotFound)
            }
        }
        Some(None) => Err(ApiError::ChatNotFound),
        None => {
            let deleted = state.history.delete_all(&user.email).await?;
            Ok(Json(MessageResponse::new(format!("Deleted {} chat messages.", deleted))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_response_shape() {
        let body = serde_json::to_value(MessageResponse::new("Talem AI server")).unwrap();
        assert_eq!(body, serde_json::json!({ "response": "Talem AI server" }));
    }
}
