//! Asynchronous ingestion: job queue and worker pool

pub mod job_queue;
pub mod worker;

pub use job_queue::{IngestionJob, JobQueue, QueueStats};
pub use worker::IngestionWorker;
