//! API server binary
//!
//! Run with: cargo run --bin rag-assistant-server

use rag_assistant::{config::AppConfig, server::ApiServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rag_assistant=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path =
        std::env::var("RAG_CONFIG_PATH").unwrap_or_else(|_| "rag-assistant.toml".to_string());
    let config = AppConfig::load_or_default(&config_path)?;

    tracing::info!("Configuration loaded from {}", config_path);
    tracing::info!("  - Vector DB: {}", config.vector_db.url);
    tracing::info!(
        "  - Embeddings: {:?} / {} ({} dims)",
        config.embedding.provider,
        config.embedding.model,
        config.embedding.dimensions
    );
    tracing::info!("  - LLM: {:?} / {}", config.llm.provider, config.llm.model);
    tracing::info!(
        "  - Chunking: {} chars, {} overlap",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );

    let server = ApiServer::new(config).await?;
    tracing::info!("API base: http://{}/v1", server.address());

    server.start().await?;

    Ok(())
}
