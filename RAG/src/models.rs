use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct EmbedRequest {
    pub model: String,
    pub texts: Vec<String>,
    pub input_type: String,
    pub embedding_types: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EmbedResponse {
    pub embeddings: EmbeddingsByType,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct EmbeddingsByType {
    #[serde(default)]
    pub float: Vec<Vec<f32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub documents: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: ChatResponseMessage,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponseMessage {
    #[serde(default)]
    pub content: Vec<ChatContent>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatContent {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: String,
}

/// Body of an Astra Data API `find` command.
#[derive(Debug, Serialize)]
pub struct FindCommand {
    pub find: FindSpec,
}

#[derive(Debug, Serialize)]
pub struct FindSpec {
    pub sort: VectorSort,
    pub options: FindOptions,
}

#[derive(Debug, Serialize)]
pub struct VectorSort {
    #[serde(rename = "$vector")]
    pub vector: Vec<f32>,
}

#[derive(Debug, Serialize)]
pub struct FindOptions {
    pub limit: usize,
}

#[derive(Debug, Deserialize)]
pub struct FindResponse {
    #[serde(default)]
    pub data: Option<FindData>,
    #[serde(default)]
    pub errors: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct FindData {
    #[serde(default)]
    pub documents: Vec<serde_json::Value>,
}
