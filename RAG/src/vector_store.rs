use crate::embedding_service::{cosine_similarity, Embedder};
use crate::models::*;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;

pub const DEFAULT_TOP_K: usize = 4;

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Returns up to `k` raw documents, most similar first.
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<Value>>;
}

/// Pulls the text body out of a stored document.
///
/// Objects are checked for `page_content` then `content`; a bare string is the
/// content itself. Anything else falls back to its JSON rendering.
pub fn extract_document_content(doc: &Value) -> String {
    match doc {
        Value::Object(map) => ["page_content", "content"]
            .iter()
            .filter_map(|key| map.get(*key).and_then(Value::as_str))
            .find(|text| !text.is_empty())
            .unwrap_or_default()
            .to_string(),
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Collection in a hosted Astra DB, queried through the JSON Data API.
pub struct AstraVectorStore {
    client: Client,
    embedder: Arc<dyn Embedder>,
    collection_url: String,
    token: String,
}

impl AstraVectorStore {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        api_endpoint: &str,
        token: impl Into<String>,
        namespace: &str,
        collection: &str,
    ) -> Self {
        let collection_url = format!(
            "{}/api/json/v1/{}/{}",
            api_endpoint.trim_end_matches('/'),
            namespace,
            collection
        );

        Self {
            client: Client::new(),
            embedder,
            collection_url,
            token: token.into(),
        }
    }
}

#[async_trait]
impl VectorStore for AstraVectorStore {
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<Value>> {
        let vector = self.embedder.embed_query(query).await?;

        let command = FindCommand {
            find: FindSpec {
                sort: VectorSort { vector },
                options: FindOptions { limit: k },
            },
        };

        let response = self.client
            .post(&self.collection_url)
            .header("Token", &self.token)
            .json(&command)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow::anyhow!("Astra DB error ({}): {}", status, error_text));
        }

        let find_response: FindResponse = response.json().await?;
        if !find_response.errors.is_empty() {
            return Err(anyhow::anyhow!(
                "Astra DB error: {}",
                Value::Array(find_response.errors)
            ));
        }

        let documents = find_response.data.map(|d| d.documents).unwrap_or_default();
        log::info!("Found {} relevant chunks", documents.len());
        Ok(documents)
    }
}

/// Vector store held in process memory, ranked by cosine similarity.
pub struct InMemoryVectorStore {
    embedder: Arc<dyn Embedder>,
    entries: Vec<(String, Vec<f32>)>,
}

impl InMemoryVectorStore {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            entries: Vec::new(),
        }
    }

    pub async fn add_text(&mut self, text: &str) -> Result<()> {
        let embedding = self.embedder.embed_query(text).await?;
        self.entries.push((text.to_string(), embedding));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<Value>> {
        let query_embedding = self.embedder.embed_query(query).await?;

        let mut scored: Vec<(&str, f32)> = self
            .entries
            .iter()
            .map(|(text, embedding)| (text.as_str(), cosine_similarity(&query_embedding, embedding)))
            .collect();

        // Sort by similarity score (highest first)
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(text, _)| serde_json::json!({ "content": text }))
            .collect())
    }
}
