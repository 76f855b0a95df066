//! Ingestion worker pool
//!
//! Each worker pulls one job at a time from the shared queue and runs it to
//! completion before taking the next. A job failure never crashes the
//! worker: it is caught, logged, and translated into a `failed` document
//! status with the error text retained on the record. There is no automatic
//! re-delivery; reprocessing requires an explicit trigger.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

use crate::error::{Error, Result};
use crate::ingestion::IngestionPipeline;
use crate::processing::job_queue::{IngestionJob, JobQueue};
use crate::registry::DocumentRegistry;
use crate::types::DocumentStatus;

/// Worker pool driving Parser -> Chunker -> Embedder -> Vector Store for
/// each delivered job
pub struct IngestionWorker {
    registry: Arc<DocumentRegistry>,
    pipeline: Arc<IngestionPipeline>,
    queue: Arc<JobQueue>,
}

impl IngestionWorker {
    /// Create the worker over its collaborators
    pub fn new(
        registry: Arc<DocumentRegistry>,
        pipeline: Arc<IngestionPipeline>,
        queue: Arc<JobQueue>,
    ) -> Self {
        Self {
            registry,
            pipeline,
            queue,
        }
    }

    /// Spawn `count` workers sharing the queue receiver
    pub fn spawn_pool(self: Arc<Self>, count: usize, receiver: mpsc::Receiver<IngestionJob>) {
        let receiver = Arc::new(Mutex::new(receiver));
        tracing::info!("Starting {} ingestion workers", count);

        for worker_id in 0..count {
            let worker = Arc::clone(&self);
            let receiver = Arc::clone(&receiver);
            tokio::spawn(async move {
                worker.run(worker_id, receiver).await;
            });
        }
    }

    async fn run(&self, worker_id: usize, receiver: Arc<Mutex<mpsc::Receiver<IngestionJob>>>) {
        loop {
            let job = {
                let mut receiver = receiver.lock().await;
                receiver.recv().await
            };
            let Some(job) = job else {
                break;
            };

            tracing::info!(
                "Worker {} processing job {} (document {})",
                worker_id,
                job.job_id,
                job.document_id
            );
            self.queue.mark_started(job.job_id);

            match self.process(&job).await {
                Ok(fragments) => {
                    self.queue.mark_completed(job.job_id, None);
                    tracing::info!(
                        "Worker {} finished document {}: {} fragments indexed",
                        worker_id,
                        job.document_id,
                        fragments
                    );
                }
                Err(e) => {
                    self.queue.mark_completed(job.job_id, Some(e.to_string()));
                    tracing::warn!(
                        "Worker {} failed document {}: {}",
                        worker_id,
                        job.document_id,
                        e
                    );
                }
            }
        }

        tracing::info!("Worker {} stopped", worker_id);
    }

    /// Run one job to completion.
    ///
    /// The per-document lease is held for the whole job so duplicate
    /// deliveries for the same document serialize; the loser then fails the
    /// `-> processing` transition guard and aborts without touching
    /// fragments.
    async fn process(&self, job: &IngestionJob) -> Result<usize> {
        let _lease = self.registry.lease(job.document_id).await;

        let Some(document) = self.registry.get(job.document_id).await? else {
            return Err(Error::DocumentNotFound(job.document_id.to_string()));
        };

        let claimed = self
            .registry
            .update_status(job.document_id, DocumentStatus::Processing, None)
            .await?;
        if !claimed {
            return Err(Error::internal(format!(
                "Document {} is not eligible for ingestion (status: {})",
                job.document_id, document.status
            )));
        }

        match self.pipeline.ingest(&document).await {
            Ok(fragments) => {
                self.registry
                    .update_status(job.document_id, DocumentStatus::Ingested, None)
                    .await?;
                Ok(fragments)
            }
            Err(e) => {
                let message = e.to_string();
                if let Err(update_err) = self
                    .registry
                    .update_status(
                        job.document_id,
                        DocumentStatus::Failed,
                        Some(message.clone()),
                    )
                    .await
                {
                    tracing::error!(
                        "Failed to mark document {} as failed: {}",
                        job.document_id,
                        update_err
                    );
                }
                Err(e)
            }
        }
    }
}
