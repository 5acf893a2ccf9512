use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Bson};
use mongodb::{Client, Collection};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// One saved conversation, as returned to the web client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub messages: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

#[async_trait]
pub trait ChatHistoryStore: Send + Sync {
    /// All records owned by `email`, oldest first.
    async fn list(&self, email: &str) -> Result<Vec<ChatRecord>, StoreError>;

    async fn save(&self, email: &str, messages: serde_json::Value) -> Result<ChatRecord, StoreError>;

    /// `Ok(false)` when no record with that id belongs to `email`.
    async fn delete_one(&self, email: &str, chat_id: &str) -> Result<bool, StoreError>;

    async fn delete_all(&self, email: &str) -> Result<u64, StoreError>;
}

fn parse_chat_id(chat_id: &str) -> Result<ObjectId, StoreError> {
    ObjectId::parse_str(chat_id)
        .map_err(|e| StoreError::InvalidId(format!("'{}' is not a valid ObjectId: {}", chat_id, e)))
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    email: String,
    messages: Bson,
    timestamp: mongodb::bson::DateTime,
}

impl From<ChatDocument> for ChatRecord {
    fn from(doc: ChatDocument) -> Self {
        Self {
            id: doc.id.map(|id| id.to_hex()).unwrap_or_default(),
            email: doc.email,
            messages: doc.messages.into_relaxed_extjson(),
            timestamp: DateTime::from_timestamp_millis(doc.timestamp.timestamp_millis()).unwrap_or_default(),
        }
    }
}

pub struct MongoChatHistoryStore {
    collection: Collection<ChatDocument>,
}

impl MongoChatHistoryStore {
    pub async fn connect(uri: &str, database: &str, collection: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).await?;
        log::info!("Connected to MongoDB chat history store ({}.{})", database, collection);
        Ok(Self {
            collection: client.database(database).collection(collection),
        })
    }
}

#[async_trait]
impl ChatHistoryStore for MongoChatHistoryStore {
    async fn list(&self, email: &str) -> Result<Vec<ChatRecord>, StoreError> {
        let cursor = self.collection.find(doc! { "email": email }).await?;
        let documents: Vec<ChatDocument> = cursor.try_collect().await?;
        Ok(documents.into_iter().map(ChatRecord::from).collect())
    }

    async fn save(&self, email: &str, messages: serde_json::Value) -> Result<ChatRecord, StoreError> {
        let messages = mongodb::bson::to_bson(&messages).map_err(|e| StoreError::Backend(e.to_string()))?;
        let document = ChatDocument {
            id: None,
            email: email.to_string(),
            messages,
            timestamp: mongodb::bson::DateTime::now(),
        };

        let result = self.collection.insert_one(&document).await?;
        let id = result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| StoreError::Backend("inserted id is not an ObjectId".to_string()))?;

        let saved = self
            .collection
            .find_one(doc! { "_id": id })
            .await?
            .ok_or_else(|| StoreError::Backend(format!("chat {} vanished after insert", id)))?;
        Ok(saved.into())
    }

    async fn delete_one(&self, email: &str, chat_id: &str) -> Result<bool, StoreError> {
        let id = parse_chat_id(chat_id)?;
        let result = self.collection.delete_one(doc! { "_id": id, "email": email }).await?;
        Ok(result.deleted_count == 1)
    }

    async fn delete_all(&self, email: &str) -> Result<u64, StoreError> {
        let result = self.collection.delete_many(doc! { "email": email }).await?;
        Ok(result.deleted_count)
    }
}

#[derive(Default)]
pub struct InMemoryChatHistoryStore {
    records: Mutex<Vec<ChatRecord>>,
}

impl InMemoryChatHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatHistoryStore for InMemoryChatHistoryStore {
    async fn list(&self, email: &str) -> Result<Vec<ChatRecord>, StoreError> {
        let records = self.records.lock().await;
        Ok(records.iter().filter(|r| r.email == email).cloned().collect())
    }

    async fn save(&self, email: &str, messages: serde_json::Value) -> Result<ChatRecord, StoreError> {
        let record = ChatRecord {
            id: ObjectId::new().to_hex(),
            email: email.to_string(),
            messages,
            timestamp: Utc::now(),
        };
        self.records.lock().await.push(record.clone());
        Ok(record)
    }

    async fn delete_one(&self, email: &str, chat_id: &str) -> Result<bool, StoreError> {
        let id = parse_chat_id(chat_id)?.to_hex();
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|r| !(r.id == id && r.email == email));
        Ok(records.len() < before)
    }

    async fn delete_all(&self, email: &str) -> Result<u64, StoreError> {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|r| r.email != email);
        Ok((before - records.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_records_are_scoped_to_owner() {
        let store = InMemoryChatHistoryStore::new();
        let mine = store.save("ada@example.com", json!([{"role": "user", "content": "hi"}])).await.unwrap();
        store.save("bob@example.com", json!([])).await.unwrap();

        let listed = store.list("ada@example.com").await.unwrap();
        assert_eq!(listed, vec![mine.clone()]);

        assert!(!store.delete_one("bob@example.com", &mine.id).await.unwrap());
        assert!(store.delete_one("ada@example.com", &mine.id).await.unwrap());
        assert!(store.list("ada@example.com").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_chat_id() {
        let store = InMemoryChatHistoryStore::new();
        let err = store.delete_one("ada@example.com", "not-an-id").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidId(_)));
    }

    #[tokio::test]
    async fn test_delete_all_counts_only_owner() {
        let store = InMemoryChatHistoryStore::new();
        store.save("ada@example.com", json!([])).await.unwrap();
        store.save("ada@example.com", json!([])).await.unwrap();
        store.save("bob@example.com", json!([])).await.unwrap();

        assert_eq!(store.delete_all("ada@example.com").await.unwrap(), 2);
        assert_eq!(store.list("bob@example.com").await.unwrap().len(), 1);
    }

    #[test]
    fn test_document_conversion() {
        let id = ObjectId::new();
        let doc = ChatDocument {
            id: Some(id),
            email: "ada@example.com".to_string(),
            messages: Bson::Array(vec![Bson::String("hello".to_string())]),
            timestamp: mongodb::bson::DateTime::from_millis(1_700_000_000_000),
        };

        let record = ChatRecord::from(doc);
        assert_eq!(record.id, id.to_hex());
        assert_eq!(record.messages, json!(["hello"]));
        assert_eq!(record.timestamp.timestamp_millis(), 1_700_000_000_000);
    }
}
