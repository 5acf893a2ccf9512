pub mod models;
pub mod error;
pub mod embedding_service;
pub mod vector_store;
pub mod cohere_service;
pub mod query_service;

pub use models::*;
pub use error::RagError;
pub use embedding_service::{Embedder, EmbeddingService};
pub use vector_store::{extract_document_content, AstraVectorStore, InMemoryVectorStore, VectorStore};
pub use cohere_service::{CohereService, LanguageModel};
pub use query_service::QueryService;
