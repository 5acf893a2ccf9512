use crate::error::StoreError;
use async_trait::async_trait;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use uuid::Uuid;

pub const SESSION_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 7);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub name: String,
    pub email: String,
}

/// A uuid4 in hex plus 16 more random hex characters.
pub fn generate_session_id() -> String {
    let extra = Uuid::new_v4().as_u64_pair().1;
    format!("{}-{:016x}", Uuid::new_v4().simple(), extra)
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, id: &str, record: &SessionRecord, ttl: Duration) -> Result<(), StoreError>;

    async fn get(&self, id: &str) -> Result<Option<SessionRecord>, StoreError>;

    async fn email(&self, id: &str) -> Result<Option<String>, StoreError> {
        Ok(self.get(id).await?.map(|record| record.email))
    }

    async fn destroy(&self, id: &str) -> Result<(), StoreError>;
}

/// Sessions as Redis hashes (`name`, `email`) with a key expiry.
#[derive(Clone)]
pub struct RedisSessionStore {
    connection: redis::aio::MultiplexedConnection,
}

impl RedisSessionStore {
    pub async fn connect(uri: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(uri)?;
        let connection = client.get_multiplexed_async_connection().await?;
        log::info!("Connected to Redis session store");
        Ok(Self { connection })
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn create(&self, id: &str, record: &SessionRecord, ttl: Duration) -> Result<(), StoreError> {
        let mut con = self.connection.clone();
        let fields = [("name", record.name.as_str()), ("email", record.email.as_str())];

        let _: () = redis::pipe()
            .atomic()
            .hset_multiple(id, &fields[..])
            .ignore()
            .expire(id, ttl.as_secs() as i64)
            .ignore()
            .query_async(&mut con)
            .await?;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<SessionRecord>, StoreError> {
        let mut con = self.connection.clone();
        let mut fields: HashMap<String, String> = con.hgetall(id).await?;

        Ok(fields.remove("email").map(|email| SessionRecord {
            name: fields.remove("name").unwrap_or_default(),
            email,
        }))
    }

    async fn email(&self, id: &str) -> Result<Option<String>, StoreError> {
        let mut con = self.connection.clone();
        let email: Option<String> = con.hget(id, "email").await?;
        Ok(email.filter(|e| !e.is_empty()))
    }

    async fn destroy(&self, id: &str) -> Result<(), StoreError> {
        let mut con = self.connection.clone();
        let _: () = con.del(id).await?;
        Ok(())
    }
}

/// Process-local sessions; expired entries are dropped when read.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, (SessionRecord, Instant)>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, id: &str, record: &SessionRecord, ttl: Duration) -> Result<(), StoreError> {
        let mut sessions = self.sessions.lock().await;
        sessions.insert(id.to_string(), (record.clone(), Instant::now() + ttl));
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<SessionRecord>, StoreError> {
        let mut sessions = self.sessions.lock().await;
        let expired = match sessions.get(id) {
            Some((_, expires_at)) => *expires_at <= Instant::now(),
            None => return Ok(None),
        };

        if expired {
            sessions.remove(id);
            return Ok(None);
        }
        Ok(sessions.get(id).map(|(record, _)| record.clone()))
    }

    async fn destroy(&self, id: &str) -> Result<(), StoreError> {
        self.sessions.lock().await.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> SessionRecord {
        SessionRecord {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
        }
    }

    #[test]
    fn test_session_id_shape() {
        let id = generate_session_id();
        let (uid, extra) = id.split_once('-').unwrap();

        assert_eq!(uid.len(), 32);
        assert_eq!(extra.len(), 16);
        assert!(id.chars().all(|c| c == '-' || c.is_ascii_hexdigit()));
        assert_ne!(id, generate_session_id());
    }

    #[tokio::test]
    async fn test_in_memory_round_trip_and_destroy() {
        let store = InMemorySessionStore::new();
        store.create("s1", &record(), SESSION_TTL).await.unwrap();

        assert_eq!(store.get("s1").await.unwrap(), Some(record()));
        assert_eq!(store.email("s1").await.unwrap().as_deref(), Some("ada@example.com"));

        store.destroy("s1").await.unwrap();
        assert_eq!(store.email("s1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_in_memory_expired_session_is_absent() {
        let store = InMemorySessionStore::new();
        store.create("old", &record(), Duration::ZERO).await.unwrap();

        assert_eq!(store.get("old").await.unwrap(), None);
        assert!(store.sessions.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_destroy_unknown_session_is_ok() {
        let store = InMemorySessionStore::new();
        assert!(store.destroy("missing").await.is_ok());
    }
}
