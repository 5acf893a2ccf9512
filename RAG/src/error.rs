use thiserror::Error;

/// Outcomes of the retrieve-then-generate pipeline that callers need to tell apart.
#[derive(Debug, Error)]
pub enum RagError {
    #[error("No relevant content found")]
    NoRelevantContent,

    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    #[error("Model inference failed: {0}")]
    Inference(String),
}
