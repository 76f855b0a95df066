//! Application state with explicit dependency injection
//!
//! Every client (vector database, embedding, LLM) is constructed once here
//! and passed by handle into the components that need it. There are no
//! process-wide singletons.

use std::sync::Arc;

use crate::config::{AppConfig, ProviderKind};
use crate::generation::AnswerSynthesizer;
use crate::ingestion::IngestionPipeline;
use crate::processing::{IngestionWorker, JobQueue};
use crate::providers::{
    EmbeddingProvider, LlmProvider, OllamaEmbedder, OllamaLlm, OpenAiEmbedder, OpenAiLlm,
};
use crate::registry::DocumentRegistry;
use crate::retrieval::Retriever;
use crate::error::Result;
use crate::storage::LocalDocumentStore;
use crate::store::VectorStoreGateway;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    gateway: Arc<VectorStoreGateway>,
    registry: Arc<DocumentRegistry>,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmProvider>,
    retriever: Retriever,
    synthesizer: AnswerSynthesizer,
    file_store: Arc<LocalDocumentStore>,
    job_queue: Arc<JobQueue>,
}

impl AppState {
    /// Build the full component graph and start the ingestion worker pool
    pub async fn new(config: AppConfig) -> Result<Self> {
        let gateway = Arc::new(VectorStoreGateway::new(
            &config.vector_db,
            config.embedding.dimensions,
        )?);
        if let Err(e) = gateway.ensure_collections().await {
            tracing::warn!(
                "Vector database not reachable at startup ({}); collections will be created on first use",
                e
            );
        }

        let registry = Arc::new(DocumentRegistry::new(Arc::clone(&gateway)));

        let embedder: Arc<dyn EmbeddingProvider> = match config.embedding.provider {
            ProviderKind::OpenAi => {
                Arc::new(OpenAiEmbedder::new(&config.llm, &config.embedding))
            }
            ProviderKind::Ollama => {
                Arc::new(OllamaEmbedder::new(&config.llm, &config.embedding))
            }
        };
        let llm: Arc<dyn LlmProvider> = match config.llm.provider {
            ProviderKind::OpenAi => Arc::new(OpenAiLlm::new(&config.llm)),
            ProviderKind::Ollama => Arc::new(OllamaLlm::new(&config.llm)),
        };
        tracing::info!(
            "Providers initialized (embedding: {} / {} dims, llm: {} / {})",
            embedder.provider_id(),
            embedder.dimensions(),
            llm.provider_id(),
            llm.model()
        );

        let retriever = Retriever::new(Arc::clone(&embedder), Arc::clone(&gateway));
        let synthesizer = AnswerSynthesizer::new(Arc::clone(&llm));
        let file_store = Arc::new(LocalDocumentStore::new(&config.storage));

        let worker_count = config.queue.worker_count();
        let (job_queue, receiver) = JobQueue::new(config.queue.capacity);
        let job_queue = Arc::new(job_queue);

        let pipeline = Arc::new(IngestionPipeline::new(
            &config,
            Arc::clone(&embedder),
            Arc::clone(&registry),
        ));
        let worker = Arc::new(IngestionWorker::new(
            Arc::clone(&registry),
            pipeline,
            Arc::clone(&job_queue),
        ));
        worker.spawn_pool(worker_count, receiver);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                gateway,
                registry,
                embedder,
                llm,
                retriever,
                synthesizer,
                file_store,
                job_queue,
            }),
        })
    }

    /// Get configuration
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get the vector store gateway
    pub fn gateway(&self) -> &Arc<VectorStoreGateway> {
        &self.inner.gateway
    }

    /// Get the document registry
    pub fn registry(&self) -> &Arc<DocumentRegistry> {
        &self.inner.registry
    }

    /// Get the embedding provider
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.inner.embedder
    }

    /// Get the LLM provider
    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.inner.llm
    }

    /// Get the retriever
    pub fn retriever(&self) -> &Retriever {
        &self.inner.retriever
    }

    /// Get the answer synthesizer
    pub fn synthesizer(&self) -> &AnswerSynthesizer {
        &self.inner.synthesizer
    }

    /// Get the upload file store
    pub fn file_store(&self) -> &Arc<LocalDocumentStore> {
        &self.inner.file_store
    }

    /// Get the job queue
    pub fn job_queue(&self) -> &Arc<JobQueue> {
        &self.inner.job_queue
    }
}
