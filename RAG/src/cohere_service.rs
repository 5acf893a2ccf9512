use crate::models::*;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_CHAT_MODEL: &str = "command-r-plus-08-2024";
pub const DEFAULT_BASE_URL: &str = "https://api.cohere.com";

const SYSTEM_PROMPT: &str = "You are a RAG chatbot. Use the documents given to properly answer the query.
If you do not understand the question, ask for clarity with insight-seeking questions.
If you don't know the answer, just say that you don't know.
Do not make up any information, and do not hallucinate.
Do not repeat the question verbatim in your answer.
Do not mention that you are getting information from a text. Talk naturally.";

/// Produces an answer to `query` grounded on `context`.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn answer(&self, context: &str, query: &str) -> Result<String>;
}

pub struct CohereService {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl CohereService {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url: String = base_url.into();

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    fn build_request(&self, context: &str, query: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::new("user", query),
                ChatMessage::new("system", SYSTEM_PROMPT),
            ],
            documents: vec![context.to_string()],
        }
    }
}

#[async_trait]
impl LanguageModel for CohereService {
    async fn answer(&self, context: &str, query: &str) -> Result<String> {
        let request = self.build_request(context, query);
        let url = format!("{}/v2/chat", self.base_url);

        let response = self.client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(anyhow::anyhow!("Cohere API error: {}", error_text));
        }

        let chat_response: ChatResponse = response.json().await?;

        let answer = chat_response
            .message
            .content
            .into_iter()
            .next()
            .map(|c| c.text)
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| "No response generated".to_string());

        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn service(base_url: String, timeout: Duration) -> CohereService {
        CohereService::new("co-key", base_url, DEFAULT_CHAT_MODEL, timeout).unwrap()
    }

    #[test]
    fn test_request_puts_context_in_documents() {
        let svc = service("http://localhost".to_string(), Duration::from_secs(1));
        let request = svc.build_request("chunk one\n\nchunk two", "what?");

        assert_eq!(request.documents, vec!["chunk one\n\nchunk two".to_string()]);
        assert_eq!(request.messages[0].role, "user");
        assert_eq!(request.messages[0].content, "what?");
        assert_eq!(request.messages[1].role, "system");
        assert!(request.messages[1].content.starts_with("You are a RAG chatbot."));
    }

    #[tokio::test]
    async fn test_answer_reads_first_text_block() {
        let server = MockServer::start_async().await;
        let chat_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v2/chat")
                    .header("authorization", "Bearer co-key")
                    .json_body_partial(r#"{"model": "command-r-plus-08-2024", "documents": ["ctx"]}"#);
                then.status(200).json_body(json!({
                    "id": "x",
                    "finish_reason": "COMPLETE",
                    "message": {
                        "role": "assistant",
                        "content": [{ "type": "text", "text": "Ownership moves values." }]
                    }
                }));
            })
            .await;

        let answer = service(server.base_url(), Duration::from_secs(5))
            .answer("ctx", "how does rust manage memory?")
            .await
            .unwrap();

        chat_mock.assert_async().await;
        assert_eq!(answer, "Ownership moves values.");
    }

    #[tokio::test]
    async fn test_empty_content_falls_back() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v2/chat");
                then.status(200).json_body(json!({ "message": { "role": "assistant", "content": [] } }));
            })
            .await;

        let answer = service(server.base_url(), Duration::from_secs(5))
            .answer("ctx", "q")
            .await
            .unwrap();

        assert_eq!(answer, "No response generated");
    }

    #[tokio::test]
    async fn test_slow_model_times_out() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v2/chat");
                then.status(200)
                    .delay(Duration::from_millis(500))
                    .json_body(json!({ "message": { "content": [] } }));
            })
            .await;

        let result = service(server.base_url(), Duration::from_millis(50))
            .answer("ctx", "q")
            .await;

        assert!(result.is_err());
    }
}
