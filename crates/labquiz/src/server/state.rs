//! Application state for the HTTP server

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::generation::{GenerationProvider, OpenAiClient};
use crate::processing::{GenerationJob, GenerationWorker, JobQueue};
use crate::storage::{Database, DocumentStore, LocalDocumentStore};
use crate::types::Document;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: AppConfig,
    /// SQLite persistence
    database: Arc<Database>,
    /// Document blob and content storage
    store: Arc<dyn DocumentStore>,
    /// Generation service client
    llm: Arc<dyn GenerationProvider>,
    /// Job queue for background generation
    job_queue: Arc<JobQueue>,
    /// Ready state
    ready: RwLock<bool>,
}

impl AppState {
    /// Create the application state and start the background worker
    pub async fn new(config: AppConfig) -> Result<Self> {
        tracing::info!("Initializing application state...");

        std::fs::create_dir_all(&config.storage.data_dir).map_err(|e| {
            Error::Config(format!(
                "Failed to create data directory {}: {}",
                config.storage.data_dir.display(),
                e
            ))
        })?;

        let database = Arc::new(Database::open(config.storage.database_path())?);
        tracing::info!("Database opened at {}", config.storage.database_path().display());

        let store: Arc<dyn DocumentStore> =
            Arc::new(LocalDocumentStore::new(config.storage.documents_dir())?);
        tracing::info!("Document store initialized ({})", store.name());

        let llm: Arc<dyn GenerationProvider> = Arc::new(OpenAiClient::new(&config.llm));
        tracing::info!(
            "Generation client initialized ({}, model: {})",
            llm.name(),
            llm.model()
        );

        let (state, receiver) = Self::build(config, database, store, llm);

        // Re-queue jobs that a previous run left unfinished
        let interrupted = state.inner.database.list_incomplete_jobs()?;
        if !interrupted.is_empty() {
            tracing::info!("Found {} interrupted jobs, re-queueing", interrupted.len());
            for job in interrupted {
                state.inner.job_queue.resume(job).await;
            }
        }

        let worker = GenerationWorker::new(
            &state.inner.config,
            state.inner.database.clone(),
            state.inner.store.clone(),
            state.inner.llm.clone(),
            state.inner.job_queue.clone(),
        );
        tokio::spawn(async move {
            worker.run(receiver).await;
        });
        tracing::info!("Generation worker started");

        Ok(state)
    }

    /// Wire the state without starting the worker
    ///
    /// The caller owns the receiver; `new` hands it to a spawned worker,
    /// tests can hold it to keep jobs pending.
    pub fn build(
        config: AppConfig,
        database: Arc<Database>,
        store: Arc<dyn DocumentStore>,
        llm: Arc<dyn GenerationProvider>,
    ) -> (Self, mpsc::Receiver<GenerationJob>) {
        let (job_queue, receiver) = JobQueue::new(database.clone(), config.processing.queue_capacity);

        let state = Self {
            inner: Arc::new(AppStateInner {
                config,
                database,
                store,
                llm,
                job_queue: Arc::new(job_queue),
                ready: RwLock::new(true),
            }),
        };

        (state, receiver)
    }

    /// Get configuration
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get the database
    pub fn database(&self) -> &Arc<Database> {
        &self.inner.database
    }

    /// Get the document store
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.inner.store
    }

    /// Get the generation provider
    pub fn llm(&self) -> &Arc<dyn GenerationProvider> {
        &self.inner.llm
    }

    /// Get the job queue
    pub fn job_queue(&self) -> &Arc<JobQueue> {
        &self.inner.job_queue
    }

    /// Check if the server is ready
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    /// Set ready state
    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }

    /// Classify an upload against already stored documents
    pub fn check_upload(&self, filename: &str, content_hash: &str) -> Result<UploadDisposition> {
        if let Some(existing) = self.inner.database.find_document_by_hash(content_hash)? {
            if existing.filename == filename {
                return Ok(UploadDisposition::Unchanged(existing));
            }
            return Ok(UploadDisposition::Duplicate(existing));
        }

        if let Some(existing) = self.inner.database.find_document_by_filename(filename)? {
            return Ok(UploadDisposition::Modified(existing));
        }

        Ok(UploadDisposition::New)
    }

    /// Delete a document and its stored files
    ///
    /// Refused while a pending or running job references the document.
    pub async fn delete_document(&self, id: &Uuid) -> Result<Document> {
        let doc = self
            .inner
            .database
            .get_document(id)?
            .ok_or_else(|| Error::not_found(format!("Document {} not found", id)))?;

        if self.inner.job_queue.active_job_for_document(id) {
            return Err(Error::conflict(format!(
                "Document '{}' has an active generation job",
                doc.filename
            )));
        }

        self.inner.database.delete_document(id)?;

        if let Err(e) = self.inner.store.delete(id, &doc.file_type).await {
            tracing::warn!("Failed to remove stored files for {}: {}", id, e);
        }

        Ok(doc)
    }

    /// Load a document or fail with NotFound
    pub fn require_document(&self, id: &Uuid) -> Result<Document> {
        self.inner
            .database
            .get_document(id)?
            .ok_or_else(|| Error::not_found(format!("Document {} not found", id)))
    }
}

/// How an upload relates to already stored documents
#[derive(Debug, Clone)]
pub enum UploadDisposition {
    /// Nothing matches, process as new
    New,
    /// Same filename, same content
    Unchanged(Document),
    /// Same content under a different filename
    Duplicate(Document),
    /// Same filename, content changed
    Modified(Document),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::GenerateOptions;
    use crate::storage::LocalDocumentStore;
    use crate::types::{DocumentStatus, FileType};
    use async_trait::async_trait;

    struct NullProvider;

    #[async_trait]
    impl GenerationProvider for NullProvider {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok("[]".to_string())
        }

        async fn generate_prose(&self, _prompt: &str) -> Result<String> {
            Ok(String::new())
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "null"
        }

        fn model(&self) -> &str {
            "null"
        }
    }

    fn test_state() -> (AppState, mpsc::Receiver<GenerationJob>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let database = Arc::new(Database::in_memory().unwrap());
        let store: Arc<dyn DocumentStore> =
            Arc::new(LocalDocumentStore::new(dir.path().to_path_buf()).unwrap());
        let (state, receiver) =
            AppState::build(AppConfig::default(), database, store, Arc::new(NullProvider));
        (state, receiver, dir)
    }

    fn ready_document(filename: &str, hash: &str) -> Document {
        let mut doc = Document::new(
            filename.to_string(),
            FileType::Txt,
            hash.to_string(),
            100,
        );
        doc.status = DocumentStatus::Ready;
        doc
    }

    #[tokio::test]
    async fn upload_disposition_covers_all_cases() {
        let (state, _receiver, _dir) = test_state();
        let doc = ready_document("lab1.txt", "hash-a");
        state.database().insert_document(&doc).unwrap();

        assert!(matches!(
            state.check_upload("lab1.txt", "hash-a").unwrap(),
            UploadDisposition::Unchanged(_)
        ));
        assert!(matches!(
            state.check_upload("copy.txt", "hash-a").unwrap(),
            UploadDisposition::Duplicate(_)
        ));
        assert!(matches!(
            state.check_upload("lab1.txt", "hash-b").unwrap(),
            UploadDisposition::Modified(_)
        ));
        assert!(matches!(
            state.check_upload("lab2.txt", "hash-b").unwrap(),
            UploadDisposition::New
        ));
    }

    #[tokio::test]
    async fn delete_with_active_job_conflicts() {
        let (state, _receiver, _dir) = test_state();
        let doc = ready_document("lab1.txt", "hash-a");
        state.database().insert_document(&doc).unwrap();

        // No worker is draining the queue, so the job stays pending
        state
            .job_queue()
            .submit(GenerationJob::new(
                doc.id,
                GenerateOptions {
                    question_count: 1,
                    ..Default::default()
                },
            ))
            .await;

        let err = state.delete_document(&doc.id).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        // Document is still there
        assert!(state.database().get_document(&doc.id).unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_without_jobs_succeeds() {
        let (state, _receiver, _dir) = test_state();
        let doc = ready_document("lab1.txt", "hash-a");
        state.database().insert_document(&doc).unwrap();

        state.delete_document(&doc.id).await.unwrap();
        assert!(state.database().get_document(&doc.id).unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_unknown_document_is_not_found() {
        let (state, _receiver, _dir) = test_state();
        let err = state.delete_document(&Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
