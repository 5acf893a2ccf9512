//! Server configuration, read from the environment (after `.env` is loaded).

use anyhow::{Context, Result};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// `production` switches session cookies to `SameSite=None; Secure`.
    pub environment: String,
    pub bind_address: String,
    pub cors_allowed_origins: Vec<String>,

    pub redis_uri: String,
    pub mongo_uri: String,
    pub mongo_database: String,
    pub mongo_collection: String,

    pub astra_api_endpoint: String,
    pub astra_token: String,
    pub astra_namespace: String,
    pub astra_collection: String,

    pub cohere_api_key: String,
    pub cohere_base_url: String,
    pub cohere_embed_model: String,
    pub cohere_chat_model: String,

    pub google_tokeninfo_url: String,

    pub retrieval_top_k: usize,
    pub retrieval_workers: usize,
    pub llm_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("{} environment variable not set", key))
        };
        let number = |key: &str, default: u64| -> Result<u64> {
            match lookup(key) {
                Some(v) => v
                    .trim()
                    .parse()
                    .with_context(|| format!("{} must be a non-negative integer, got {:?}", key, v)),
                None => Ok(default),
            }
        };

        Ok(Self {
            environment: or("ENV", "development"),
            bind_address: or("BIND_ADDR", "0.0.0.0:8000"),
            cors_allowed_origins: or("CORS_ALLOWED_ORIGINS", "https://ai.talem.org,http://localhost:5173")
                .split(',')
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty())
                .collect(),

            redis_uri: required("REDIS_URI")?,
            mongo_uri: required("MONGO_DB_URI")?,
            mongo_database: or("MONGO_DB_NAME", "chat_database"),
            mongo_collection: or("MONGO_COLLECTION", "chat_history"),

            astra_api_endpoint: required("ASTRA_DB_API_ENDPOINT")?,
            astra_token: required("ASTRA_DB_APPLICATION_TOKEN")?,
            astra_namespace: or("ASTRA_DB_NAMESPACE", "default_keyspace"),
            astra_collection: or("ASTRA_DB_COLLECTION", "main_v6"),

            cohere_api_key: required("COHERE_API_KEY")?,
            cohere_base_url: or("COHERE_BASE_URL", talem_rag::cohere_service::DEFAULT_BASE_URL),
            cohere_embed_model: or("COHERE_EMBED_MODEL", talem_rag::embedding_service::DEFAULT_EMBED_MODEL),
            cohere_chat_model: or("COHERE_CHAT_MODEL", talem_rag::cohere_service::DEFAULT_CHAT_MODEL),

            google_tokeninfo_url: or("GOOGLE_TOKENINFO_URL", crate::auth::GOOGLE_TOKENINFO_URL),

            retrieval_top_k: number("RETRIEVAL_TOP_K", talem_rag::vector_store::DEFAULT_TOP_K as u64)? as usize,
            retrieval_workers: number(
                "RETRIEVAL_WORKERS",
                talem_rag::query_service::DEFAULT_RETRIEVAL_WORKERS as u64,
            )? as usize,
            llm_timeout: Duration::from_secs(number("LLM_TIMEOUT_SECS", 60)?),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
