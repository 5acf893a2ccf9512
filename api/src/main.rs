use anyhow::Result;
use std::sync::Arc;
use talem_api::auth::{GoogleTokenVerifier, SessionManager};
use talem_api::chat_history::MongoChatHistoryStore;
use talem_api::session::RedisSessionStore;
use talem_api::{router, AppState, Config};
use talem_rag::{AstraVectorStore, CohereService, EmbeddingService, QueryService};

async fn build_state(config: &Config) -> Result<AppState> {
    log::info!("Initializing Cohere embeddings...");
    let embeddings = Arc::new(EmbeddingService::new(
        config.cohere_api_key.clone(),
        config.cohere_base_url.clone(),
        config.cohere_embed_model.clone(),
    ));

    log::info!("Initializing vectorstore...");
    let vector_store = Arc::new(AstraVectorStore::new(
        embeddings,
        &config.astra_api_endpoint,
        config.astra_token.clone(),
        &config.astra_namespace,
        &config.astra_collection,
    ));

    let language_model = Arc::new(CohereService::new(
        config.cohere_api_key.clone(),
        config.cohere_base_url.clone(),
        config.cohere_chat_model.clone(),
        config.llm_timeout,
    )?);

    let rag = Arc::new(QueryService::new(
        vector_store,
        language_model,
        config.retrieval_workers,
        config.retrieval_top_k,
    ));

    let session_store = RedisSessionStore::connect(&config.redis_uri).await?;
    let verifier = GoogleTokenVerifier::new(config.google_tokeninfo_url.clone())?;
    let history = MongoChatHistoryStore::connect(
        &config.mongo_uri,
        &config.mongo_database,
        &config.mongo_collection,
    )
    .await?;

    Ok(AppState {
        production: config.is_production(),
        sessions: SessionManager::new(Arc::new(verifier), Arc::new(session_store)),
        history: Arc::new(history),
        rag,
    })
}

#[tokio::main]
async fn main() {
    // Initialize environment variables and logging
    dotenv::dotenv().ok();
    env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    let state = match build_state(&config).await {
        Ok(state) => state,
        Err(e) => {
            log::error!("Startup failed: {:#}", e);
            std::process::exit(1);
        }
    };
    log::info!("Initialization complete ({} mode)", config.environment);

    let app = router(state, &config.cors_allowed_origins);

    let listener = match tokio::net::TcpListener::bind(&config.bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            log::error!("Failed to bind {}: {}", config.bind_address, e);
            std::process::exit(1);
        }
    };
    log::info!("Listening on {}", config.bind_address);

    if let Err(e) = axum::serve(listener, app).await {
        log::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
