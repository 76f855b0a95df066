//! Job queue decoupling upload handling from ingestion work
//!
//! Delivery is at-least-once with no ordering guarantee across jobs. Job
//! records are ephemeral bookkeeping for the queue's delivery lifetime; the
//! durable truth of whether ingestion succeeded lives in the document's
//! status, not here.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::{Error, Result};

/// An ingestion job for a single document
#[derive(Debug, Clone, Serialize)]
pub struct IngestionJob {
    /// Queue-assigned job ID
    pub job_id: Uuid,
    /// Target document
    pub document_id: Uuid,
    /// When the job was enqueued
    pub enqueued_at: DateTime<Utc>,
    /// When a worker picked the job up
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// When the job finished (successfully or not)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Error description if the job failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IngestionJob {
    fn new(document_id: Uuid) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            document_id,
            enqueued_at: Utc::now(),
            started_at: None,
            completed_at: None,
            error: None,
        }
    }
}

/// Queue statistics
#[derive(Debug, Clone, Serialize)]
pub struct QueueStats {
    pub total_jobs: usize,
    pub queued: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Bounded job queue feeding the ingestion worker pool
pub struct JobQueue {
    sender: mpsc::Sender<IngestionJob>,
    jobs: DashMap<Uuid, IngestionJob>,
    depth: AtomicUsize,
}

impl JobQueue {
    /// Create a queue and the receiver the worker pool consumes from
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<IngestionJob>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self {
                sender,
                jobs: DashMap::new(),
                depth: AtomicUsize::new(0),
            },
            receiver,
        )
    }

    /// Enqueue an ingestion job for a document, returning its handle
    pub async fn enqueue(&self, document_id: Uuid) -> Result<IngestionJob> {
        let job = IngestionJob::new(document_id);
        self.jobs.insert(job.job_id, job.clone());
        self.depth.fetch_add(1, Ordering::SeqCst);

        if let Err(e) = self.sender.send(job.clone()).await {
            self.jobs.remove(&job.job_id);
            self.depth.fetch_sub(1, Ordering::SeqCst);
            return Err(Error::internal(format!("Failed to enqueue job: {}", e)));
        }

        tracing::info!("Enqueued job {} for document {}", job.job_id, document_id);
        Ok(job)
    }

    /// Look up a job by id
    pub fn get(&self, job_id: Uuid) -> Option<IngestionJob> {
        self.jobs.get(&job_id).map(|j| j.clone())
    }

    /// Record that a worker picked the job up
    pub fn mark_started(&self, job_id: Uuid) {
        if let Some(mut job) = self.jobs.get_mut(&job_id) {
            job.started_at = Some(Utc::now());
        }
    }

    /// Record that the job finished; a failed job carries its error text
    pub fn mark_completed(&self, job_id: Uuid, error: Option<String>) {
        if let Some(mut job) = self.jobs.get_mut(&job_id) {
            job.completed_at = Some(Utc::now());
            job.error = error;
        }
        self.depth.fetch_sub(1, Ordering::SeqCst);
    }

    /// Number of jobs enqueued but not yet completed
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }

    /// Aggregate queue statistics
    pub fn stats(&self) -> QueueStats {
        let mut stats = QueueStats {
            total_jobs: self.jobs.len(),
            queued: 0,
            running: 0,
            completed: 0,
            failed: 0,
        };
        for job in self.jobs.iter() {
            match (job.started_at, job.completed_at, &job.error) {
                (None, _, _) => stats.queued += 1,
                (Some(_), None, _) => stats.running += 1,
                (Some(_), Some(_), None) => stats.completed += 1,
                (Some(_), Some(_), Some(_)) => stats.failed += 1,
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn enqueue_delivers_and_tracks_job() {
        let (queue, mut receiver) = JobQueue::new(10);
        let document_id = Uuid::new_v4();

        let job = queue.enqueue(document_id).await.unwrap();
        assert_eq!(job.document_id, document_id);
        assert_eq!(queue.depth(), 1);

        let delivered = receiver.recv().await.unwrap();
        assert_eq!(delivered.job_id, job.job_id);

        let tracked = queue.get(job.job_id).unwrap();
        assert!(tracked.started_at.is_none());
        assert!(tracked.completed_at.is_none());
    }

    #[tokio::test]
    async fn job_lifecycle_is_recorded() {
        let (queue, _receiver) = JobQueue::new(10);
        let job = queue.enqueue(Uuid::new_v4()).await.unwrap();

        queue.mark_started(job.job_id);
        assert!(queue.get(job.job_id).unwrap().started_at.is_some());

        queue.mark_completed(job.job_id, Some("parse error".to_string()));
        let finished = queue.get(job.job_id).unwrap();
        assert!(finished.completed_at.is_some());
        assert_eq!(finished.error.as_deref(), Some("parse error"));
        assert_eq!(queue.depth(), 0);

        let stats = queue.stats();
        assert_eq!(stats.total_jobs, 1);
        assert_eq!(stats.failed, 1);
    }

    #[tokio::test]
    async fn enqueue_fails_when_receiver_dropped() {
        let (queue, receiver) = JobQueue::new(10);
        drop(receiver);
        let result = queue.enqueue(Uuid::new_v4()).await;
        assert!(result.is_err());
        assert_eq!(queue.depth(), 0);
    }
}
