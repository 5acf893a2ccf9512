use crate::cookie;
use crate::error::{ApiError, StoreError};
use crate::session::{generate_session_id, SessionRecord, SessionStore, SESSION_TTL};
use crate::state::AppState;
use crate::utils::mask;
use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

pub const GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// The signed-in user, placed in request extensions by [`precheck`].
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleIdentity {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    email: Option<String>,
    given_name: Option<String>,
    family_name: Option<String>,
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// `None` when the token is not a valid Google ID token.
    async fn verify(&self, token: &str) -> Option<GoogleIdentity>;
}

pub struct GoogleTokenVerifier {
    client: Client,
    tokeninfo_url: String,
}

impl GoogleTokenVerifier {
    pub fn new(tokeninfo_url: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(5)).build()?;
        Ok(Self {
            client,
            tokeninfo_url: tokeninfo_url.into(),
        })
    }
}

#[async_trait]
impl TokenVerifier for GoogleTokenVerifier {
    async fn verify(&self, token: &str) -> Option<GoogleIdentity> {
        let response = match self.client
            .get(&self.tokeninfo_url)
            .query(&[("id_token", token)])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                log::error!("Token info request failed: {}", e);
                return None;
            }
        };

        if response.status() != StatusCode::OK {
            log::warn!("Rejected token {} ({})", mask(token), response.status());
            return None;
        }

        let info: TokenInfo = match response.json().await {
            Ok(info) => info,
            Err(e) => {
                log::error!("Malformed token info response: {}", e);
                return None;
            }
        };

        let email = info.email.filter(|e| !e.is_empty())?;
        let name = [info.given_name, info.family_name]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string();

        Some(GoogleIdentity { name, email })
    }
}

/// Session lifecycle on top of a token verifier and a session store.
#[derive(Clone)]
pub struct SessionManager {
    verifier: Arc<dyn TokenVerifier>,
    store: Arc<dyn SessionStore>,
}

impl SessionManager {
    pub fn new(verifier: Arc<dyn TokenVerifier>, store: Arc<dyn SessionStore>) -> Self {
        Self { verifier, store }
    }

    /// Verifies `token` and stores a fresh session; `None` if verification failed.
    pub async fn create_session(&self, token: &str) -> Result<Option<String>, StoreError> {
        let Some(identity) = self.verifier.verify(token).await else {
            return Ok(None);
        };

        let session_id = generate_session_id();
        let record = SessionRecord {
            name: identity.name,
            email: identity.email,
        };
        self.store.create(&session_id, &record, SESSION_TTL).await?;

        log::info!("Created session {} for {}", mask(&session_id), record.email);
        Ok(Some(session_id))
    }

    pub async fn session_email(&self, jar: &CookieJar) -> Result<Option<String>, StoreError> {
        match cookie::session_id(jar) {
            Some(id) => self.store.email(&id).await,
            None => Ok(None),
        }
    }

    pub async fn destroy_session(&self, jar: &CookieJar) -> Result<(), StoreError> {
        let id = cookie::session_id(jar)
            .ok_or(StoreError::NoSession)?;
        self.store.destroy(&id).await?;
        log::info!("Destroyed session {}", mask(&id));
        Ok(())
    }
}

/// Rejects requests without a live session before the handler runs.
pub async fn precheck(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let email = match state.sessions.session_email(&jar).await {
        Ok(email) => email,
        Err(e) => {
            log::error!("Session lookup failed: {}", e);
            None
        }
    };

    match email {
        Some(email) => {
            request.extensions_mut().insert(SessionUser { email });
            Ok(next.run(request).await)
        }
        None => Err(ApiError::Unauthorized),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::InMemorySessionStore;
    use axum_extra::extract::cookie::Cookie;
    use httpmock::prelude::*;
    use serde_json::json;

    struct StaticVerifier;

    #[async_trait]
    impl TokenVerifier for StaticVerifier {
        async fn verify(&self, token: &str) -> Option<GoogleIdentity> {
            (token == "good").then(|| GoogleIdentity {
                name: "Ada Lovelace".to_string(),
                email: "ada@example.com".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_google_verifier_accepts_valid_token() {
        let server = MockServer::start_async().await;
        let tokeninfo = server
            .mock_async(|when, then| {
                when.method(GET).path("/tokeninfo").query_param("id_token", "tok-123");
                then.status(200).json_body(json!({
                    "email": "ada@example.com",
                    "given_name": "Ada",
                    "family_name": "Lovelace",
                    "email_verified": "true"
                }));
            })
            .await;

        let verifier = GoogleTokenVerifier::new(server.url("/tokeninfo")).unwrap();
        let identity = verifier.verify("tok-123").await;

        tokeninfo.assert_async().await;
        assert_eq!(
            identity,
            Some(GoogleIdentity {
                name: "Ada Lovelace".to_string(),
                email: "ada@example.com".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_google_verifier_rejects_invalid_token() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/tokeninfo");
                then.status(400).json_body(json!({
                    "error": "invalid_token",
                    "error_description": "Invalid Value"
                }));
            })
            .await;

        let verifier = GoogleTokenVerifier::new(server.url("/tokeninfo")).unwrap();
        assert_eq!(verifier.verify("bogus").await, None);
    }

    #[tokio::test]
    async fn test_google_verifier_requires_email() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/tokeninfo");
                then.status(200).json_body(json!({ "given_name": "Ada" }));
            })
            .await;

        let verifier = GoogleTokenVerifier::new(server.url("/tokeninfo")).unwrap();
        assert_eq!(verifier.verify("tok").await, None);
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let manager = SessionManager::new(Arc::new(StaticVerifier), Arc::new(InMemorySessionStore::new()));

        assert_eq!(manager.create_session("bad").await.unwrap(), None);

        let id = manager.create_session("good").await.unwrap().unwrap();
        let jar = CookieJar::new().add(Cookie::new(cookie::SESSION_COOKIE, id));
        assert_eq!(
            manager.session_email(&jar).await.unwrap().as_deref(),
            Some("ada@example.com")
        );

        manager.destroy_session(&jar).await.unwrap();
        assert_eq!(manager.session_email(&jar).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_destroy_without_cookie_fails() {
        let manager = SessionManager::new(Arc::new(StaticVerifier), Arc::new(InMemorySessionStore::new()));
        let err = manager.destroy_session(&CookieJar::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::NoSession));
    }
}
