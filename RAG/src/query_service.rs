use crate::cohere_service::LanguageModel;
use crate::error::RagError;
use crate::vector_store::{extract_document_content, VectorStore};
use std::sync::Arc;
use tokio::sync::Semaphore;

pub const DEFAULT_RETRIEVAL_WORKERS: usize = 2;

/// Retrieves context for a query and asks the language model to answer it.
pub struct QueryService {
    vector_store: Arc<dyn VectorStore>,
    language_model: Arc<dyn LanguageModel>,
    retrieval_permits: Semaphore,
    top_k: usize,
}

impl QueryService {
    pub fn new(
        vector_store: Arc<dyn VectorStore>,
        language_model: Arc<dyn LanguageModel>,
        retrieval_workers: usize,
        top_k: usize,
    ) -> Self {
        Self {
            vector_store,
            language_model,
            retrieval_permits: Semaphore::new(retrieval_workers.max(1)),
            top_k,
        }
    }

    pub async fn answer(&self, query: &str) -> Result<String, RagError> {
        let start_time = std::time::Instant::now();

        let context = self.retrieve_context(query).await?;
        if context.is_empty() {
            return Err(RagError::NoRelevantContent);
        }

        let response = self.language_model
            .answer(&context, query)
            .await
            .map_err(|e| {
                log::error!("Model inference error: {:#}", e);
                RagError::Inference(format!("{:#}", e))
            })?;

        log::info!("Answered query in {} ms", start_time.elapsed().as_millis());
        Ok(response)
    }

    async fn retrieve_context(&self, query: &str) -> Result<String, RagError> {
        let documents = {
            let _permit = self.retrieval_permits
                .acquire()
                .await
                .map_err(|e| RagError::Retrieval(e.to_string()))?;

            self.vector_store
                .similarity_search(query, self.top_k)
                .await
                .map_err(|e| {
                    log::error!("Retrieval error details: {:#}", e);
                    RagError::Retrieval(format!("{:#}", e))
                })?
        };

        let context_parts: Vec<String> = documents
            .iter()
            .map(extract_document_content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .collect();

        Ok(context_parts.join("\n\n"))
    }
}
