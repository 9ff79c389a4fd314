//! Job queue for background question generation with persistence
//!
//! Jobs are persisted to SQLite so their history survives a restart. The
//! in-memory map holds the live view for fast polling.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::storage::Database;
use crate::types::Difficulty;

/// Job state machine: pending, then running, then succeeded or failed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "running" => Self::Running,
            "succeeded" => Self::Succeeded,
            "failed" => Self::Failed,
            _ => Self::Pending,
        }
    }

    /// Terminal states stay terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Processing stage within a running job
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    Queued,
    Selecting,
    Generating,
    Persisting,
    Complete,
    Failed,
}

impl JobStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Selecting => "selecting",
            Self::Generating => "generating",
            Self::Persisting => "persisting",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "selecting" => Self::Selecting,
            "generating" => Self::Generating,
            "persisting" => Self::Persisting,
            "complete" => Self::Complete,
            "failed" => Self::Failed,
            _ => Self::Queued,
        }
    }
}

/// What a generation job should produce
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Optional topic for context selection
    pub topic: Option<String>,
    /// Quiz questions to generate
    pub question_count: u32,
    /// Flashcards to generate
    pub flashcard_count: u32,
    /// Difficulty applied when the model omits one
    pub difficulty: Option<Difficulty>,
}

/// A queued generation job
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub id: Uuid,
    pub document_id: Uuid,
    pub options: GenerateOptions,
}

impl GenerationJob {
    pub fn new(document_id: Uuid, options: GenerateOptions) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            options,
        }
    }
}

/// Progress information for a job, also the persisted record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobProgress {
    pub id: Uuid,
    pub document_id: Uuid,
    pub state: JobState,
    pub stage: JobStage,
    pub topic: Option<String>,
    pub questions_requested: u32,
    pub flashcards_requested: u32,
    pub questions_generated: u32,
    pub flashcards_generated: u32,
    pub warnings: Vec<String>,
    pub error: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl JobProgress {
    pub fn new(
        id: Uuid,
        document_id: Uuid,
        topic: Option<String>,
        questions_requested: u32,
        flashcards_requested: u32,
    ) -> Self {
        let now = chrono::Utc::now();
        Self {
            id,
            document_id,
            state: JobState::Pending,
            stage: JobStage::Queued,
            topic,
            questions_requested,
            flashcards_requested,
            questions_generated: 0,
            flashcards_generated: 0,
            warnings: Vec::new(),
            error: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }
}

/// Queue statistics
#[derive(Debug, Clone, Serialize)]
pub struct QueueStats {
    pub total_jobs: usize,
    pub pending: usize,
    pub running: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Job queue for managing background generation with persistence
pub struct JobQueue {
    /// Live jobs with progress
    jobs: Arc<DashMap<Uuid, JobProgress>>,
    /// Channel for sending jobs to the worker
    sender: mpsc::Sender<GenerationJob>,
    /// Jobs waiting or running
    queue_size: Arc<AtomicUsize>,
    /// Database for persistence
    database: Arc<Database>,
}

impl JobQueue {
    /// Create a new job queue with database persistence
    pub fn new(
        database: Arc<Database>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<GenerationJob>) {
        let (sender, receiver) = mpsc::channel(capacity);

        let queue = Self {
            jobs: Arc::new(DashMap::new()),
            sender,
            queue_size: Arc::new(AtomicUsize::new(0)),
            database,
        };

        (queue, receiver)
    }

    /// Submit a job for processing
    pub async fn submit(&self, job: GenerationJob) -> Uuid {
        let job_id = job.id;

        let progress = JobProgress::new(
            job_id,
            job.document_id,
            job.options.topic.clone(),
            job.options.question_count,
            job.options.flashcard_count,
        );
        self.jobs.insert(job_id, progress.clone());
        self.queue_size.fetch_add(1, Ordering::SeqCst);

        if let Err(e) = self.database.insert_job(&progress) {
            tracing::error!("Failed to persist job {}: {}", job_id, e);
        }

        if let Err(e) = self.sender.send(job).await {
            tracing::error!("Failed to submit job {}: {}", job_id, e);
            self.fail(job_id, &e.to_string());
        }

        job_id
    }

    /// Re-queue a job that was interrupted by a restart
    ///
    /// The persisted record carries everything needed to run it again.
    pub async fn resume(&self, mut progress: JobProgress) -> Option<Uuid> {
        let job = GenerationJob {
            id: progress.id,
            document_id: progress.document_id,
            options: GenerateOptions {
                topic: progress.topic.clone(),
                question_count: progress.questions_requested,
                flashcard_count: progress.flashcards_requested,
                difficulty: None,
            },
        };

        progress.state = JobState::Pending;
        progress.stage = JobStage::Queued;
        progress.updated_at = chrono::Utc::now();

        self.jobs.insert(job.id, progress.clone());
        self.queue_size.fetch_add(1, Ordering::SeqCst);

        if let Err(e) = self.database.update_job(&progress) {
            tracing::error!("Failed to persist resumed job {}: {}", progress.id, e);
        }

        let job_id = job.id;
        if let Err(e) = self.sender.send(job).await {
            tracing::error!("Failed to resume job {}: {}", job_id, e);
            self.fail(job_id, &e.to_string());
            return None;
        }

        tracing::info!("Resumed interrupted job {}", job_id);
        Some(job_id)
    }

    /// Get job progress, falling back to the database for old jobs
    pub fn get_progress(&self, job_id: &Uuid) -> Option<JobProgress> {
        if let Some(progress) = self.jobs.get(job_id) {
            return Some(progress.clone());
        }
        self.database.get_job(job_id).ok().flatten()
    }

    /// List all jobs, newest first, live entries overriding persisted ones
    pub fn list_jobs(&self) -> Vec<JobProgress> {
        let mut jobs = self.database.list_jobs().unwrap_or_default();
        for job in &mut jobs {
            if let Some(live) = self.jobs.get(&job.id) {
                *job = live.clone();
            }
        }
        jobs
    }

    /// True when a pending or running job references the document
    pub fn active_job_for_document(&self, document_id: &Uuid) -> bool {
        self.jobs.iter().any(|entry| {
            entry.document_id == *document_id && !entry.state.is_terminal()
        })
    }

    /// Mark a job as running
    pub fn start(&self, job_id: Uuid) {
        self.update(job_id, |p| {
            p.state = JobState::Running;
            p.stage = JobStage::Selecting;
        });
    }

    /// Update the stage of a running job
    pub fn set_stage(&self, job_id: Uuid, stage: JobStage) {
        self.update(job_id, |p| p.stage = stage);
    }

    /// Record generated counts
    pub fn set_generated(&self, job_id: Uuid, questions: u32, flashcards: u32) {
        self.update(job_id, |p| {
            p.questions_generated = questions;
            p.flashcards_generated = flashcards;
        });
    }

    /// Attach a warning
    pub fn add_warning(&self, job_id: Uuid, warning: impl Into<String>) {
        let warning = warning.into();
        self.update(job_id, move |p| p.warnings.push(warning));
    }

    /// Mark a job as succeeded
    pub fn complete(&self, job_id: Uuid) {
        self.update(job_id, |p| {
            p.state = JobState::Succeeded;
            p.stage = JobStage::Complete;
            p.completed_at = Some(chrono::Utc::now());
        });
        self.queue_size.fetch_sub(1, Ordering::SeqCst);
    }

    /// Mark a job as failed
    pub fn fail(&self, job_id: Uuid, error: &str) {
        self.update(job_id, |p| {
            p.state = JobState::Failed;
            p.stage = JobStage::Failed;
            p.error = Some(error.to_string());
            p.completed_at = Some(chrono::Utc::now());
        });
        self.queue_size.fetch_sub(1, Ordering::SeqCst);
    }

    /// Apply a mutation to the live entry, then persist
    fn update<F: FnOnce(&mut JobProgress)>(&self, job_id: Uuid, f: F) {
        if let Some(mut progress) = self.jobs.get_mut(&job_id) {
            f(&mut progress);
            progress.updated_at = chrono::Utc::now();
            let snapshot = progress.clone();
            drop(progress);

            if let Err(e) = self.database.update_job(&snapshot) {
                tracing::error!("Failed to persist job {} state: {}", job_id, e);
            }
        }
    }

    /// Get queue statistics
    pub fn stats(&self) -> QueueStats {
        let jobs = self.list_jobs();
        QueueStats {
            total_jobs: jobs.len(),
            pending: jobs.iter().filter(|j| j.state == JobState::Pending).count(),
            running: jobs.iter().filter(|j| j.state == JobState::Running).count(),
            succeeded: jobs
                .iter()
                .filter(|j| j.state == JobState::Succeeded)
                .count(),
            failed: jobs.iter().filter(|j| j.state == JobState::Failed).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn submit_persists_and_tracks_active_document() {
        let database = Arc::new(Database::in_memory().unwrap());
        let (queue, mut receiver) = JobQueue::new(database.clone(), 16);

        let document_id = Uuid::new_v4();
        let job = GenerationJob::new(
            document_id,
            GenerateOptions {
                topic: Some("acids".into()),
                question_count: 5,
                flashcard_count: 0,
                difficulty: None,
            },
        );

        let job_id = queue.submit(job).await;
        assert!(receiver.recv().await.is_some());

        assert!(queue.active_job_for_document(&document_id));
        let progress = queue.get_progress(&job_id).unwrap();
        assert_eq!(progress.state, JobState::Pending);
        assert_eq!(progress.questions_requested, 5);

        // Also visible through the database
        assert!(database.get_job(&job_id).unwrap().is_some());
    }

    #[tokio::test]
    async fn terminal_jobs_release_the_document() {
        let database = Arc::new(Database::in_memory().unwrap());
        let (queue, _receiver) = JobQueue::new(database, 16);

        let document_id = Uuid::new_v4();
        let job = GenerationJob::new(document_id, GenerateOptions::default());
        let job_id = queue.submit(job).await;

        queue.start(job_id);
        assert!(queue.active_job_for_document(&document_id));

        queue.fail(job_id, "provider unavailable");
        assert!(!queue.active_job_for_document(&document_id));

        let progress = queue.get_progress(&job_id).unwrap();
        assert_eq!(progress.state, JobState::Failed);
        assert_eq!(progress.error.as_deref(), Some("provider unavailable"));
        assert!(progress.completed_at.is_some());
    }

    #[tokio::test]
    async fn stats_reflect_job_states() {
        let database = Arc::new(Database::in_memory().unwrap());
        let (queue, _receiver) = JobQueue::new(database, 16);

        let a = queue
            .submit(GenerationJob::new(Uuid::new_v4(), GenerateOptions::default()))
            .await;
        let _b = queue
            .submit(GenerationJob::new(Uuid::new_v4(), GenerateOptions::default()))
            .await;

        queue.start(a);
        queue.complete(a);

        let stats = queue.stats();
        assert_eq!(stats.total_jobs, 2);
        assert_eq!(stats.succeeded, 1);
        assert_eq!(stats.pending, 1);
    }
}
