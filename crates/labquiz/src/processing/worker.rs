//! Background worker for generation jobs
//!
//! Consumes jobs one at a time: select context, call the generation service,
//! persist the results, finalize the job. Every job ends succeeded or failed.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::config::{AppConfig, ChunkingConfig, GenerationConfig};
use crate::content::{ContextSelector, TextChunker};
use crate::error::{Error, Result};
use crate::generation::{
    parse_flashcards, parse_questions, GeneratedFlashcard, GeneratedQuestion, GenerationProvider,
    PromptBuilder,
};
use crate::storage::{Database, DocumentStore};
use crate::types::{
    AnswerOption, Difficulty, Document, DocumentStatus, Flashcard, Question, QuestionKind,
    QuestionStatus,
};

use super::job_queue::{GenerateOptions, GenerationJob, JobQueue, JobStage};

/// Characters of context snapshotted onto each generated item
const SOURCE_CONTEXT_CHARS: usize = 300;

/// Worker that turns queued jobs into persisted questions
pub struct GenerationWorker {
    database: Arc<Database>,
    store: Arc<dyn DocumentStore>,
    llm: Arc<dyn GenerationProvider>,
    job_queue: Arc<JobQueue>,
    chunking: ChunkingConfig,
    generation: GenerationConfig,
    job_timeout: Duration,
}

impl GenerationWorker {
    /// Create a new worker
    pub fn new(
        config: &AppConfig,
        database: Arc<Database>,
        store: Arc<dyn DocumentStore>,
        llm: Arc<dyn GenerationProvider>,
        job_queue: Arc<JobQueue>,
    ) -> Self {
        Self {
            database,
            store,
            llm,
            job_queue,
            chunking: config.chunking.clone(),
            generation: config.generation.clone(),
            job_timeout: Duration::from_secs(config.processing.job_timeout_secs),
        }
    }

    /// Process jobs from the queue until the channel closes
    pub async fn run(self, mut receiver: mpsc::Receiver<GenerationJob>) {
        tracing::info!(
            "Generation worker started ({}s job timeout)",
            self.job_timeout.as_secs()
        );

        while let Some(job) = receiver.recv().await {
            let job_id = job.id;
            tracing::info!(
                "Processing job {} for document {} ({} questions, {} flashcards)",
                job_id,
                job.document_id,
                job.options.question_count,
                job.options.flashcard_count
            );

            self.job_queue.start(job_id);

            match timeout(self.job_timeout, self.process_job(&job)).await {
                Ok(Ok(())) => {
                    self.job_queue.complete(job_id);
                    tracing::info!("Job {} completed", job_id);
                }
                Ok(Err(e)) => {
                    tracing::error!("Job {} failed: {}", job_id, e);
                    self.job_queue.fail(job_id, &e.to_string());
                }
                Err(_) => {
                    tracing::error!(
                        "Job {} timed out after {}s",
                        job_id,
                        self.job_timeout.as_secs()
                    );
                    self.job_queue.fail(
                        job_id,
                        &format!("Generation timeout after {}s", self.job_timeout.as_secs()),
                    );
                }
            }
        }

        tracing::info!("Generation worker stopped");
    }

    /// Run one job end to end
    async fn process_job(&self, job: &GenerationJob) -> Result<()> {
        let job_id = job.id;

        let doc = self
            .database
            .get_document(&job.document_id)?
            .ok_or_else(|| Error::not_found(format!("Document {} not found", job.document_id)))?;

        if doc.status != DocumentStatus::Ready {
            return Err(Error::validation(format!(
                "Document '{}' is not ready for generation (status: {})",
                doc.filename,
                doc.status.as_str()
            )));
        }

        let content = self.store.load_content(&doc.id).await?;

        let (chunk_size, overlap) = self.chunking.sizes_for_length(content.len());
        let chunks = TextChunker::new(chunk_size, overlap)
            .with_min_size(self.chunking.min_chunk_size)
            .chunk(&content);

        let selector = ContextSelector::new(
            self.generation.max_context_chars,
            self.generation.min_context_chars,
        );
        let context = selector.select(job.options.topic.as_deref(), &chunks);
        if context.is_empty() {
            return Err(Error::validation(
                "No relevant context found for the requested topic",
            ));
        }

        self.job_queue.set_stage(job_id, JobStage::Generating);
        let topic_label = job
            .options
            .topic
            .clone()
            .unwrap_or_else(|| doc.filename.clone());

        let mut last_error: Option<Error> = None;

        let questions = self
            .generate_questions(job_id, &doc, &job.options, &topic_label, &context, &mut last_error)
            .await;
        let flashcards = self
            .generate_flashcards(job_id, &doc, &job.options, &topic_label, &context, &mut last_error)
            .await;

        self.job_queue.set_stage(job_id, JobStage::Persisting);
        if !questions.is_empty() {
            self.database.insert_questions(&questions)?;
        }
        if !flashcards.is_empty() {
            self.database.insert_flashcards(&flashcards)?;
        }

        let questions_generated = questions.len() as u32;
        let flashcards_generated = flashcards.len() as u32;
        self.job_queue
            .set_generated(job_id, questions_generated, flashcards_generated);

        if job.options.question_count > 0 && questions_generated < job.options.question_count {
            self.job_queue.add_warning(
                job_id,
                format!(
                    "Could only generate {}/{} questions ({} failed)",
                    questions_generated,
                    job.options.question_count,
                    job.options.question_count - questions_generated
                ),
            );
        }
        if job.options.flashcard_count > 0 && flashcards_generated < job.options.flashcard_count {
            self.job_queue.add_warning(
                job_id,
                format!(
                    "Could only generate {}/{} flashcards ({} failed)",
                    flashcards_generated,
                    job.options.flashcard_count,
                    job.options.flashcard_count - flashcards_generated
                ),
            );
        }

        if questions_generated == 0 && flashcards_generated == 0 {
            return Err(last_error
                .unwrap_or_else(|| Error::generation("Model produced no usable items")));
        }

        Ok(())
    }

    /// Generate quiz questions in batches
    async fn generate_questions(
        &self,
        job_id: uuid::Uuid,
        doc: &Document,
        options: &GenerateOptions,
        topic: &str,
        context: &str,
        last_error: &mut Option<Error>,
    ) -> Vec<Question> {
        let mut rows = Vec::new();
        let mut remaining = options.question_count;

        while remaining > 0 {
            let batch = remaining.min(self.generation.questions_per_batch);
            let prompt = PromptBuilder::questions(topic, context, batch);

            match self.llm.generate(&prompt).await {
                Ok(response) => {
                    let items = parse_questions(&response);
                    if items.is_empty() {
                        tracing::warn!("[job {}] Model returned no usable questions", job_id);
                    }
                    for item in items.into_iter().take(batch as usize) {
                        rows.push(self.question_from_generated(doc, options, context, item));
                    }
                }
                Err(e) => {
                    tracing::error!("[job {}] Question generation call failed: {}", job_id, e);
                    *last_error = Some(e);
                    break;
                }
            }

            remaining = remaining.saturating_sub(batch);
        }

        rows
    }

    /// Generate flashcards in batches
    async fn generate_flashcards(
        &self,
        job_id: uuid::Uuid,
        doc: &Document,
        options: &GenerateOptions,
        topic: &str,
        context: &str,
        last_error: &mut Option<Error>,
    ) -> Vec<Flashcard> {
        let mut rows = Vec::new();
        let mut remaining = options.flashcard_count;

        while remaining > 0 {
            let batch = remaining.min(self.generation.flashcards_per_batch);
            let prompt = PromptBuilder::flashcards(topic, context, batch);

            match self.llm.generate(&prompt).await {
                Ok(response) => {
                    let items = parse_flashcards(&response);
                    if items.is_empty() {
                        tracing::warn!("[job {}] Model returned no usable flashcards", job_id);
                    }
                    for item in items.into_iter().take(batch as usize) {
                        rows.push(self.flashcard_from_generated(doc, options, item));
                    }
                }
                Err(e) => {
                    tracing::error!("[job {}] Flashcard generation call failed: {}", job_id, e);
                    *last_error = Some(e);
                    break;
                }
            }

            remaining = remaining.saturating_sub(batch);
        }

        rows
    }

    fn question_from_generated(
        &self,
        doc: &Document,
        options: &GenerateOptions,
        context: &str,
        item: GeneratedQuestion,
    ) -> Question {
        let now = chrono::Utc::now();
        let difficulty = item
            .difficulty_level
            .as_deref()
            .map(Difficulty::parse)
            .or(options.difficulty)
            .unwrap_or_default();
        let kind = item
            .kind
            .as_deref()
            .map(QuestionKind::parse)
            .unwrap_or_default();
        let answer_options = item
            .options
            .iter()
            .map(|opt| AnswerOption::new(opt.clone(), *opt == item.correct_answer))
            .collect();

        Question {
            id: uuid::Uuid::new_v4(),
            document_id: doc.id,
            prompt: item.question,
            kind,
            difficulty,
            topic: options.topic.clone(),
            correct_answer: item.correct_answer,
            explanation: item
                .explanation
                .or_else(|| Some("Generated from context".to_string())),
            options: answer_options,
            source_context: Some(truncate_chars(context, SOURCE_CONTEXT_CHARS)),
            generation_model: Some(self.llm.model().to_string()),
            status: QuestionStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }

    fn flashcard_from_generated(
        &self,
        doc: &Document,
        options: &GenerateOptions,
        item: GeneratedFlashcard,
    ) -> Flashcard {
        Flashcard {
            id: uuid::Uuid::new_v4(),
            document_id: doc.id,
            card_type: item
                .card_type
                .unwrap_or_else(|| "concept_flashcard".to_string()),
            front: item.question,
            back: item.answer,
            explanation: item.explanation,
            topic: options.topic.clone(),
            generation_model: Some(self.llm.model().to_string()),
            created_at: chrono::Utc::now(),
        }
    }
}

/// Truncate at a char boundary
fn truncate_chars(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::{JobProgress, JobState};
    use crate::storage::LocalDocumentStore;
    use crate::types::FileType;
    use async_trait::async_trait;
    use uuid::Uuid;

    const QUESTION_JSON: &str = r#"[
        {"question": "Which indicator marks the endpoint?", "type": "multiple_choice",
         "difficulty_level": "easy", "correct_answer": "Phenolphthalein",
         "explanation": "It changes color near pH 8.",
         "options": ["Phenolphthalein", "Litmus", "Starch", "Methyl orange"]}
    ]"#;

    const FLASHCARD_JSON: &str = r#"[
        {"type": "definition_flashcard", "question": "What is titration?",
         "answer": "Adding a solution of known concentration to find an unknown one.",
         "explanation": "Core volumetric analysis technique."}
    ]"#;

    /// Returns canned JSON, picking the shape from the prompt
    struct ScriptedProvider;

    #[async_trait]
    impl GenerationProvider for ScriptedProvider {
        async fn generate(&self, prompt: &str) -> crate::error::Result<String> {
            if prompt.contains("flashcards") {
                Ok(FLASHCARD_JSON.to_string())
            } else {
                Ok(QUESTION_JSON.to_string())
            }
        }

        async fn generate_prose(&self, _prompt: &str) -> crate::error::Result<String> {
            Ok("summary text".to_string())
        }

        async fn health_check(&self) -> crate::error::Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "test-model"
        }
    }

    /// Always errors
    struct BrokenProvider;

    #[async_trait]
    impl GenerationProvider for BrokenProvider {
        async fn generate(&self, _prompt: &str) -> crate::error::Result<String> {
            Err(Error::generation("service unavailable"))
        }

        async fn generate_prose(&self, _prompt: &str) -> crate::error::Result<String> {
            Err(Error::generation("service unavailable"))
        }

        async fn health_check(&self) -> crate::error::Result<bool> {
            Ok(false)
        }

        fn name(&self) -> &str {
            "broken"
        }

        fn model(&self) -> &str {
            "test-model"
        }
    }

    struct Harness {
        database: Arc<Database>,
        queue: Arc<JobQueue>,
        document_id: Uuid,
        _dir: tempfile::TempDir,
    }

    async fn start_worker(provider: Arc<dyn GenerationProvider>) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let database = Arc::new(Database::in_memory().unwrap());
        let store = Arc::new(LocalDocumentStore::new(dir.path().to_path_buf()).unwrap());

        let content = "Titration is a volumetric analysis technique. Fill the burette with \
                       sodium hydroxide of known concentration. Add the base slowly to the acid \
                       until the phenolphthalein indicator turns faint pink, which marks the \
                       endpoint of the titration.";

        let mut doc = crate::types::Document::new(
            "titration_lab.txt".to_string(),
            FileType::Txt,
            "hash-titration".to_string(),
            content.len() as u64,
        );
        doc.status = DocumentStatus::Ready;
        doc.text_length = content.len();
        database.insert_document(&doc).unwrap();
        store.store_content(&doc.id, content).await.unwrap();

        let config = AppConfig::default();
        let (queue, receiver) = JobQueue::new(database.clone(), 16);
        let queue = Arc::new(queue);

        let worker = GenerationWorker::new(
            &config,
            database.clone(),
            store,
            provider,
            queue.clone(),
        );
        tokio::spawn(async move {
            worker.run(receiver).await;
        });

        Harness {
            database,
            queue,
            document_id: doc.id,
            _dir: dir,
        }
    }

    async fn wait_for_terminal(queue: &JobQueue, job_id: Uuid) -> JobProgress {
        for _ in 0..500 {
            if let Some(progress) = queue.get_progress(&job_id) {
                if progress.state.is_terminal() {
                    return progress;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {} never reached a terminal state", job_id);
    }

    #[tokio::test]
    async fn job_succeeds_and_persists_items() {
        let harness = start_worker(Arc::new(ScriptedProvider)).await;

        let job = GenerationJob::new(
            harness.document_id,
            GenerateOptions {
                topic: Some("titration".into()),
                question_count: 1,
                flashcard_count: 1,
                difficulty: None,
            },
        );
        let job_id = harness.queue.submit(job).await;

        let progress = wait_for_terminal(&harness.queue, job_id).await;
        assert_eq!(progress.state, JobState::Succeeded);
        assert_eq!(progress.questions_generated, 1);
        assert_eq!(progress.flashcards_generated, 1);
        assert!(progress.warnings.is_empty());

        let questions = harness
            .database
            .list_questions_by_document(&harness.document_id)
            .unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].options.len(), 4);
        assert_eq!(
            questions[0]
                .options
                .iter()
                .filter(|o| o.is_correct)
                .count(),
            1
        );
        assert_eq!(questions[0].generation_model.as_deref(), Some("test-model"));
        assert_eq!(questions[0].status, QuestionStatus::Draft);

        let cards = harness
            .database
            .list_flashcards_by_document(&harness.document_id)
            .unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].card_type, "definition_flashcard");
    }

    #[tokio::test]
    async fn shortfall_succeeds_with_warning() {
        let harness = start_worker(Arc::new(ScriptedProvider)).await;

        let job = GenerationJob::new(
            harness.document_id,
            GenerateOptions {
                topic: Some("titration".into()),
                question_count: 5,
                flashcard_count: 0,
                difficulty: None,
            },
        );
        let job_id = harness.queue.submit(job).await;

        let progress = wait_for_terminal(&harness.queue, job_id).await;
        assert_eq!(progress.state, JobState::Succeeded);
        assert_eq!(progress.questions_generated, 1);
        assert_eq!(progress.warnings.len(), 1);
        assert!(progress.warnings[0].contains("1/5"));
    }

    #[tokio::test]
    async fn provider_failure_fails_the_job() {
        let harness = start_worker(Arc::new(BrokenProvider)).await;

        let job = GenerationJob::new(
            harness.document_id,
            GenerateOptions {
                topic: None,
                question_count: 3,
                flashcard_count: 0,
                difficulty: None,
            },
        );
        let job_id = harness.queue.submit(job).await;

        let progress = wait_for_terminal(&harness.queue, job_id).await;
        assert_eq!(progress.state, JobState::Failed);
        assert!(progress.error.as_deref().unwrap().contains("service unavailable"));
    }

    #[tokio::test]
    async fn unknown_document_fails_the_job() {
        let harness = start_worker(Arc::new(ScriptedProvider)).await;

        let job = GenerationJob::new(
            Uuid::new_v4(),
            GenerateOptions {
                topic: None,
                question_count: 1,
                flashcard_count: 0,
                difficulty: None,
            },
        );
        let job_id = harness.queue.submit(job).await;

        let progress = wait_for_terminal(&harness.queue, job_id).await;
        assert_eq!(progress.state, JobState::Failed);
        assert!(progress.error.as_deref().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn unrelated_topic_fails_with_no_context() {
        let harness = start_worker(Arc::new(ScriptedProvider)).await;

        let job = GenerationJob::new(
            harness.document_id,
            GenerateOptions {
                topic: Some("quantum electrodynamics renormalization".into()),
                question_count: 2,
                flashcard_count: 0,
                difficulty: None,
            },
        );
        let job_id = harness.queue.submit(job).await;

        let progress = wait_for_terminal(&harness.queue, job_id).await;
        assert_eq!(progress.state, JobState::Failed);
        assert!(progress
            .error
            .as_deref()
            .unwrap()
            .contains("No relevant context"));
    }
}
