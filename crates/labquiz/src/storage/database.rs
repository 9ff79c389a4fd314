//! SQLite persistence for documents, questions, flashcards, summaries, and jobs
//!
//! One connection behind a mutex, WAL mode for concurrent readers.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::processing::{JobProgress, JobStage, JobState};
use crate::types::{
    AnswerOption, Difficulty, Document, DocumentStatus, DocumentSummary, FileType, Flashcard,
    Question, QuestionKind, QuestionStatus,
};

/// SQLite-backed persistence layer
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Create or open the database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| Error::Database(format!("Failed to open database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Database(format!("Failed to open in-memory database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate()?;
        Ok(db)
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA foreign_keys=ON;
            PRAGMA cache_size=10000;
            PRAGMA temp_store=MEMORY;
        "#,
        )
        .map_err(|e| Error::Database(format!("Failed to set pragmas: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                filename TEXT NOT NULL,
                file_type TEXT NOT NULL,
                content_hash TEXT NOT NULL,
                file_size INTEGER NOT NULL,
                text_length INTEGER NOT NULL DEFAULT 0,
                total_pages INTEGER,
                status TEXT NOT NULL,
                storage_uri TEXT,
                content_uri TEXT,
                metadata TEXT,
                uploaded_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_documents_filename ON documents(filename);
            CREATE INDEX IF NOT EXISTS idx_documents_content_hash ON documents(content_hash);

            CREATE TABLE IF NOT EXISTS questions (
                id TEXT PRIMARY KEY,
                document_id TEXT NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
                prompt TEXT NOT NULL,
                kind TEXT NOT NULL,
                difficulty TEXT NOT NULL,
                topic TEXT,
                correct_answer TEXT NOT NULL,
                explanation TEXT,
                source_context TEXT,
                generation_model TEXT,
                status TEXT NOT NULL DEFAULT 'draft',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_questions_document_id ON questions(document_id);
            CREATE INDEX IF NOT EXISTS idx_questions_status ON questions(status);

            CREATE TABLE IF NOT EXISTS question_options (
                id TEXT PRIMARY KEY,
                question_id TEXT NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
                content TEXT NOT NULL,
                is_correct INTEGER NOT NULL DEFAULT 0,
                position INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_question_options_question_id
                ON question_options(question_id);

            CREATE TABLE IF NOT EXISTS flashcards (
                id TEXT PRIMARY KEY,
                document_id TEXT NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
                card_type TEXT NOT NULL,
                front TEXT NOT NULL,
                back TEXT NOT NULL,
                explanation TEXT,
                topic TEXT,
                generation_model TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_flashcards_document_id ON flashcards(document_id);

            CREATE TABLE IF NOT EXISTS summaries (
                document_id TEXT PRIMARY KEY REFERENCES documents(id) ON DELETE CASCADE,
                content TEXT NOT NULL,
                source_word_count INTEGER NOT NULL DEFAULT 0,
                summary_word_count INTEGER NOT NULL DEFAULT 0,
                generation_model TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS jobs (
                id TEXT PRIMARY KEY,
                document_id TEXT NOT NULL,
                state TEXT NOT NULL,
                stage TEXT NOT NULL,
                topic TEXT,
                questions_requested INTEGER NOT NULL DEFAULT 0,
                flashcards_requested INTEGER NOT NULL DEFAULT 0,
                questions_generated INTEGER NOT NULL DEFAULT 0,
                flashcards_generated INTEGER NOT NULL DEFAULT 0,
                warnings TEXT,
                error TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                completed_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_jobs_state ON jobs(state);
            CREATE INDEX IF NOT EXISTS idx_jobs_document_id ON jobs(document_id);
        "#,
        )
        .map_err(|e| Error::Database(format!("Failed to run migrations: {}", e)))?;

        tracing::info!("Database migrations complete");
        Ok(())
    }

    // ==================== Document Operations ====================

    /// Insert a document record
    pub fn insert_document(&self, doc: &Document) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            r#"
            INSERT INTO documents (
                id, filename, file_type, content_hash, file_size, text_length,
                total_pages, status, storage_uri, content_uri, metadata,
                uploaded_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                doc.id.to_string(),
                doc.filename,
                doc.file_type.extension(),
                doc.content_hash,
                doc.file_size as i64,
                doc.text_length as i64,
                doc.total_pages.map(|p| p as i64),
                doc.status.as_str(),
                doc.storage_uri,
                doc.content_uri,
                serde_json::to_string(&doc.metadata).ok(),
                doc.uploaded_at.to_rfc3339(),
                doc.updated_at.to_rfc3339(),
            ],
        )
        .map_err(|e| Error::Database(format!("Failed to insert document: {}", e)))?;

        Ok(())
    }

    /// Update an existing document record
    pub fn update_document(&self, doc: &Document) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            r#"
            UPDATE documents SET
                filename = ?2, file_type = ?3, content_hash = ?4, file_size = ?5,
                text_length = ?6, total_pages = ?7, status = ?8, storage_uri = ?9,
                content_uri = ?10, metadata = ?11, updated_at = ?12
            WHERE id = ?1
            "#,
            params![
                doc.id.to_string(),
                doc.filename,
                doc.file_type.extension(),
                doc.content_hash,
                doc.file_size as i64,
                doc.text_length as i64,
                doc.total_pages.map(|p| p as i64),
                doc.status.as_str(),
                doc.storage_uri,
                doc.content_uri,
                serde_json::to_string(&doc.metadata).ok(),
                doc.updated_at.to_rfc3339(),
            ],
        )
        .map_err(|e| Error::Database(format!("Failed to update document: {}", e)))?;

        Ok(())
    }

    /// Update only the processing status of a document
    pub fn update_document_status(&self, id: &Uuid, status: DocumentStatus) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            "UPDATE documents SET status = ?2, updated_at = ?3 WHERE id = ?1",
            params![id.to_string(), status.as_str(), Utc::now().to_rfc3339()],
        )
        .map_err(|e| Error::Database(format!("Failed to update document status: {}", e)))?;

        Ok(())
    }

    /// Get a document by ID
    pub fn get_document(&self, id: &Uuid) -> Result<Option<Document>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare("SELECT * FROM documents WHERE id = ?1")?;
        let doc = stmt
            .query_row(params![id.to_string()], row_to_document)
            .optional()
            .map_err(|e| Error::Database(format!("Failed to get document: {}", e)))?;

        Ok(doc)
    }

    /// List all documents, newest first
    pub fn list_documents(&self) -> Result<Vec<Document>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare("SELECT * FROM documents ORDER BY uploaded_at DESC")?;
        let docs = stmt
            .query_map([], row_to_document)
            .map_err(|e| Error::Database(format!("Failed to list documents: {}", e)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(docs)
    }

    /// Find a document by extracted-content hash
    pub fn find_document_by_hash(&self, content_hash: &str) -> Result<Option<Document>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare("SELECT * FROM documents WHERE content_hash = ?1 LIMIT 1")?;
        let doc = stmt
            .query_row(params![content_hash], row_to_document)
            .optional()
            .map_err(|e| Error::Database(format!("Failed to find document by hash: {}", e)))?;

        Ok(doc)
    }

    /// Find a document by filename
    pub fn find_document_by_filename(&self, filename: &str) -> Result<Option<Document>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare("SELECT * FROM documents WHERE filename = ?1 LIMIT 1")?;
        let doc = stmt
            .query_row(params![filename], row_to_document)
            .optional()
            .map_err(|e| Error::Database(format!("Failed to find document by filename: {}", e)))?;

        Ok(doc)
    }

    /// Rename a document, returns false when the ID is unknown
    pub fn rename_document(&self, id: &Uuid, new_filename: &str) -> Result<bool> {
        let conn = self.conn.lock();

        let count = conn
            .execute(
                "UPDATE documents SET filename = ?2, updated_at = ?3 WHERE id = ?1",
                params![id.to_string(), new_filename, Utc::now().to_rfc3339()],
            )
            .map_err(|e| Error::Database(format!("Failed to rename document: {}", e)))?;

        Ok(count > 0)
    }

    /// Delete a document; questions, flashcards, and summaries cascade
    pub fn delete_document(&self, id: &Uuid) -> Result<bool> {
        let conn = self.conn.lock();

        let count = conn
            .execute(
                "DELETE FROM documents WHERE id = ?1",
                params![id.to_string()],
            )
            .map_err(|e| Error::Database(format!("Failed to delete document: {}", e)))?;

        Ok(count > 0)
    }

    /// Count questions attached to a document
    pub fn count_questions_for_document(&self, document_id: &Uuid) -> Result<usize> {
        let conn = self.conn.lock();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM questions WHERE document_id = ?1",
                params![document_id.to_string()],
                |row| row.get(0),
            )
            .map_err(|e| Error::Database(format!("Failed to count questions: {}", e)))?;

        Ok(count as usize)
    }

    // ==================== Question Operations ====================

    /// Insert a question with its options in one transaction
    pub fn insert_question(&self, question: &Question) -> Result<()> {
        self.insert_questions(std::slice::from_ref(question))?;
        Ok(())
    }

    /// Insert a batch of questions transactionally, returns how many were written
    pub fn insert_questions(&self, questions: &[Question]) -> Result<usize> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::Database(format!("Failed to start transaction: {}", e)))?;

        for question in questions {
            tx.execute(
                r#"
                INSERT INTO questions (
                    id, document_id, prompt, kind, difficulty, topic, correct_answer,
                    explanation, source_context, generation_model, status,
                    created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                "#,
                params![
                    question.id.to_string(),
                    question.document_id.to_string(),
                    question.prompt,
                    question.kind.as_str(),
                    question.difficulty.as_str(),
                    question.topic,
                    question.correct_answer,
                    question.explanation,
                    question.source_context,
                    question.generation_model,
                    question.status.as_str(),
                    question.created_at.to_rfc3339(),
                    question.updated_at.to_rfc3339(),
                ],
            )
            .map_err(|e| Error::Database(format!("Failed to insert question: {}", e)))?;

            for (position, option) in question.options.iter().enumerate() {
                tx.execute(
                    r#"
                    INSERT INTO question_options (id, question_id, content, is_correct, position)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    "#,
                    params![
                        option.id.to_string(),
                        question.id.to_string(),
                        option.content,
                        option.is_correct as i64,
                        position as i64,
                    ],
                )
                .map_err(|e| Error::Database(format!("Failed to insert option: {}", e)))?;
            }
        }

        tx.commit()
            .map_err(|e| Error::Database(format!("Failed to commit questions: {}", e)))?;

        Ok(questions.len())
    }

    /// Get a question with its options
    pub fn get_question(&self, id: &Uuid) -> Result<Option<Question>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare("SELECT * FROM questions WHERE id = ?1")?;
        let question = stmt
            .query_row(params![id.to_string()], row_to_question)
            .optional()
            .map_err(|e| Error::Database(format!("Failed to get question: {}", e)))?;

        match question {
            Some(mut q) => {
                q.options = load_options(&conn, &q.id)?;
                Ok(Some(q))
            }
            None => Ok(None),
        }
    }

    /// List questions for a document, oldest first
    pub fn list_questions_by_document(&self, document_id: &Uuid) -> Result<Vec<Question>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare("SELECT * FROM questions WHERE document_id = ?1 ORDER BY created_at ASC")?;
        let mut questions: Vec<Question> = stmt
            .query_map(params![document_id.to_string()], row_to_question)
            .map_err(|e| Error::Database(format!("Failed to list questions: {}", e)))?
            .filter_map(|r| r.ok())
            .collect();

        for question in &mut questions {
            question.options = load_options(&conn, &question.id)?;
        }

        Ok(questions)
    }

    /// Replace a question row and its options
    pub fn update_question(&self, question: &Question) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::Database(format!("Failed to start transaction: {}", e)))?;

        tx.execute(
            r#"
            UPDATE questions SET
                prompt = ?2, kind = ?3, difficulty = ?4, topic = ?5, correct_answer = ?6,
                explanation = ?7, status = ?8, updated_at = ?9
            WHERE id = ?1
            "#,
            params![
                question.id.to_string(),
                question.prompt,
                question.kind.as_str(),
                question.difficulty.as_str(),
                question.topic,
                question.correct_answer,
                question.explanation,
                question.status.as_str(),
                question.updated_at.to_rfc3339(),
            ],
        )
        .map_err(|e| Error::Database(format!("Failed to update question: {}", e)))?;

        tx.execute(
            "DELETE FROM question_options WHERE question_id = ?1",
            params![question.id.to_string()],
        )
        .map_err(|e| Error::Database(format!("Failed to clear options: {}", e)))?;

        for (position, option) in question.options.iter().enumerate() {
            tx.execute(
                r#"
                INSERT INTO question_options (id, question_id, content, is_correct, position)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    option.id.to_string(),
                    question.id.to_string(),
                    option.content,
                    option.is_correct as i64,
                    position as i64,
                ],
            )
            .map_err(|e| Error::Database(format!("Failed to insert option: {}", e)))?;
        }

        tx.commit()
            .map_err(|e| Error::Database(format!("Failed to commit question update: {}", e)))?;

        Ok(())
    }

    /// Delete a question, returns false when the ID is unknown
    pub fn delete_question(&self, id: &Uuid) -> Result<bool> {
        let conn = self.conn.lock();

        let count = conn
            .execute(
                "DELETE FROM questions WHERE id = ?1",
                params![id.to_string()],
            )
            .map_err(|e| Error::Database(format!("Failed to delete question: {}", e)))?;

        Ok(count > 0)
    }

    // ==================== Flashcard Operations ====================

    /// Insert a flashcard
    pub fn insert_flashcard(&self, card: &Flashcard) -> Result<()> {
        self.insert_flashcards(std::slice::from_ref(card))?;
        Ok(())
    }

    /// Insert a batch of flashcards transactionally
    pub fn insert_flashcards(&self, cards: &[Flashcard]) -> Result<usize> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::Database(format!("Failed to start transaction: {}", e)))?;

        for card in cards {
            tx.execute(
                r#"
                INSERT INTO flashcards (
                    id, document_id, card_type, front, back, explanation, topic,
                    generation_model, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
                params![
                    card.id.to_string(),
                    card.document_id.to_string(),
                    card.card_type,
                    card.front,
                    card.back,
                    card.explanation,
                    card.topic,
                    card.generation_model,
                    card.created_at.to_rfc3339(),
                ],
            )
            .map_err(|e| Error::Database(format!("Failed to insert flashcard: {}", e)))?;
        }

        tx.commit()
            .map_err(|e| Error::Database(format!("Failed to commit flashcards: {}", e)))?;

        Ok(cards.len())
    }

    /// Get a flashcard by ID
    pub fn get_flashcard(&self, id: &Uuid) -> Result<Option<Flashcard>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare("SELECT * FROM flashcards WHERE id = ?1")?;
        let card = stmt
            .query_row(params![id.to_string()], row_to_flashcard)
            .optional()
            .map_err(|e| Error::Database(format!("Failed to get flashcard: {}", e)))?;

        Ok(card)
    }

    /// List flashcards for a document, oldest first
    pub fn list_flashcards_by_document(&self, document_id: &Uuid) -> Result<Vec<Flashcard>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare("SELECT * FROM flashcards WHERE document_id = ?1 ORDER BY created_at ASC")?;
        let cards = stmt
            .query_map(params![document_id.to_string()], row_to_flashcard)
            .map_err(|e| Error::Database(format!("Failed to list flashcards: {}", e)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(cards)
    }

    /// Update a flashcard
    pub fn update_flashcard(&self, card: &Flashcard) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            r#"
            UPDATE flashcards SET
                card_type = ?2, front = ?3, back = ?4, explanation = ?5, topic = ?6
            WHERE id = ?1
            "#,
            params![
                card.id.to_string(),
                card.card_type,
                card.front,
                card.back,
                card.explanation,
                card.topic,
            ],
        )
        .map_err(|e| Error::Database(format!("Failed to update flashcard: {}", e)))?;

        Ok(())
    }

    /// Delete a flashcard, returns false when the ID is unknown
    pub fn delete_flashcard(&self, id: &Uuid) -> Result<bool> {
        let conn = self.conn.lock();

        let count = conn
            .execute(
                "DELETE FROM flashcards WHERE id = ?1",
                params![id.to_string()],
            )
            .map_err(|e| Error::Database(format!("Failed to delete flashcard: {}", e)))?;

        Ok(count > 0)
    }

    // ==================== Summary Operations ====================

    /// Insert or replace the summary for a document
    pub fn upsert_summary(&self, summary: &DocumentSummary) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            r#"
            INSERT INTO summaries (
                document_id, content, source_word_count, summary_word_count,
                generation_model, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(document_id) DO UPDATE SET
                content = excluded.content,
                source_word_count = excluded.source_word_count,
                summary_word_count = excluded.summary_word_count,
                generation_model = excluded.generation_model,
                updated_at = excluded.updated_at
            "#,
            params![
                summary.document_id.to_string(),
                summary.content,
                summary.source_word_count as i64,
                summary.summary_word_count as i64,
                summary.generation_model,
                summary.created_at.to_rfc3339(),
                summary.updated_at.to_rfc3339(),
            ],
        )
        .map_err(|e| Error::Database(format!("Failed to upsert summary: {}", e)))?;

        Ok(())
    }

    /// Get the summary for a document
    pub fn get_summary(&self, document_id: &Uuid) -> Result<Option<DocumentSummary>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare("SELECT * FROM summaries WHERE document_id = ?1")?;
        let summary = stmt
            .query_row(params![document_id.to_string()], row_to_summary)
            .optional()
            .map_err(|e| Error::Database(format!("Failed to get summary: {}", e)))?;

        Ok(summary)
    }

    // ==================== Job Operations ====================

    /// Insert a job record
    pub fn insert_job(&self, job: &JobProgress) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            r#"
            INSERT INTO jobs (
                id, document_id, state, stage, topic,
                questions_requested, flashcards_requested,
                questions_generated, flashcards_generated,
                warnings, error, created_at, updated_at, completed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                job.id.to_string(),
                job.document_id.to_string(),
                job.state.as_str(),
                job.stage.as_str(),
                job.topic,
                job.questions_requested as i64,
                job.flashcards_requested as i64,
                job.questions_generated as i64,
                job.flashcards_generated as i64,
                serde_json::to_string(&job.warnings).ok(),
                job.error,
                job.created_at.to_rfc3339(),
                job.updated_at.to_rfc3339(),
                job.completed_at.map(|t| t.to_rfc3339()),
            ],
        )
        .map_err(|e| Error::Database(format!("Failed to insert job: {}", e)))?;

        Ok(())
    }

    /// Update a job record
    pub fn update_job(&self, job: &JobProgress) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            r#"
            UPDATE jobs SET
                state = ?2, stage = ?3,
                questions_generated = ?4, flashcards_generated = ?5,
                warnings = ?6, error = ?7, updated_at = ?8, completed_at = ?9
            WHERE id = ?1
            "#,
            params![
                job.id.to_string(),
                job.state.as_str(),
                job.stage.as_str(),
                job.questions_generated as i64,
                job.flashcards_generated as i64,
                serde_json::to_string(&job.warnings).ok(),
                job.error,
                job.updated_at.to_rfc3339(),
                job.completed_at.map(|t| t.to_rfc3339()),
            ],
        )
        .map_err(|e| Error::Database(format!("Failed to update job: {}", e)))?;

        Ok(())
    }

    /// Get a job by ID
    pub fn get_job(&self, id: &Uuid) -> Result<Option<JobProgress>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare("SELECT * FROM jobs WHERE id = ?1")?;
        let job = stmt
            .query_row(params![id.to_string()], row_to_job)
            .optional()
            .map_err(|e| Error::Database(format!("Failed to get job: {}", e)))?;

        Ok(job)
    }

    /// List all jobs, newest first
    pub fn list_jobs(&self) -> Result<Vec<JobProgress>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare("SELECT * FROM jobs ORDER BY created_at DESC")?;
        let jobs = stmt
            .query_map([], row_to_job)
            .map_err(|e| Error::Database(format!("Failed to list jobs: {}", e)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(jobs)
    }

    /// List jobs that were left pending or running (for restart visibility)
    pub fn list_incomplete_jobs(&self) -> Result<Vec<JobProgress>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(
            "SELECT * FROM jobs WHERE state IN ('pending', 'running') ORDER BY created_at ASC",
        )?;
        let jobs = stmt
            .query_map([], row_to_job)
            .map_err(|e| Error::Database(format!("Failed to list incomplete jobs: {}", e)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(jobs)
    }
}

// ==================== Row Mappers ====================

fn parse_uuid(idx: usize, value: String) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(&value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_timestamp(idx: usize, value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn row_to_document(row: &Row<'_>) -> rusqlite::Result<Document> {
    let id: String = row.get("id")?;
    let file_type: String = row.get("file_type")?;
    let uploaded_at: String = row.get("uploaded_at")?;
    let updated_at: String = row.get("updated_at")?;
    let status: String = row.get("status")?;
    let metadata: Option<String> = row.get("metadata")?;

    Ok(Document {
        id: parse_uuid(0, id)?,
        filename: row.get("filename")?,
        file_type: FileType::from_extension(&file_type),
        content_hash: row.get("content_hash")?,
        file_size: row.get::<_, i64>("file_size")? as u64,
        text_length: row.get::<_, i64>("text_length")? as usize,
        total_pages: row.get::<_, Option<i64>>("total_pages")?.map(|p| p as u32),
        status: DocumentStatus::parse(&status),
        storage_uri: row.get("storage_uri")?,
        content_uri: row.get("content_uri")?,
        uploaded_at: parse_timestamp(11, uploaded_at)?,
        updated_at: parse_timestamp(12, updated_at)?,
        metadata: metadata
            .and_then(|m| serde_json::from_str(&m).ok())
            .unwrap_or_default(),
    })
}

fn row_to_question(row: &Row<'_>) -> rusqlite::Result<Question> {
    let id: String = row.get("id")?;
    let document_id: String = row.get("document_id")?;
    let kind: String = row.get("kind")?;
    let difficulty: String = row.get("difficulty")?;
    let status: String = row.get("status")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(Question {
        id: parse_uuid(0, id)?,
        document_id: parse_uuid(1, document_id)?,
        prompt: row.get("prompt")?,
        kind: QuestionKind::parse(&kind),
        difficulty: Difficulty::parse(&difficulty),
        topic: row.get("topic")?,
        correct_answer: row.get("correct_answer")?,
        explanation: row.get("explanation")?,
        options: Vec::new(),
        source_context: row.get("source_context")?,
        generation_model: row.get("generation_model")?,
        status: QuestionStatus::parse(&status),
        created_at: parse_timestamp(11, created_at)?,
        updated_at: parse_timestamp(12, updated_at)?,
    })
}

fn load_options(conn: &Connection, question_id: &Uuid) -> Result<Vec<AnswerOption>> {
    let mut stmt = conn.prepare(
        "SELECT id, content, is_correct FROM question_options
         WHERE question_id = ?1 ORDER BY position ASC",
    )?;

    let options = stmt
        .query_map(params![question_id.to_string()], |row| {
            let id: String = row.get(0)?;
            Ok(AnswerOption {
                id: parse_uuid(0, id)?,
                content: row.get(1)?,
                is_correct: row.get::<_, i64>(2)? != 0,
            })
        })
        .map_err(|e| Error::Database(format!("Failed to load options: {}", e)))?
        .filter_map(|r| r.ok())
        .collect();

    Ok(options)
}

fn row_to_flashcard(row: &Row<'_>) -> rusqlite::Result<Flashcard> {
    let id: String = row.get("id")?;
    let document_id: String = row.get("document_id")?;
    let created_at: String = row.get("created_at")?;

    Ok(Flashcard {
        id: parse_uuid(0, id)?,
        document_id: parse_uuid(1, document_id)?,
        card_type: row.get("card_type")?,
        front: row.get("front")?,
        back: row.get("back")?,
        explanation: row.get("explanation")?,
        topic: row.get("topic")?,
        generation_model: row.get("generation_model")?,
        created_at: parse_timestamp(8, created_at)?,
    })
}

fn row_to_summary(row: &Row<'_>) -> rusqlite::Result<DocumentSummary> {
    let document_id: String = row.get("document_id")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(DocumentSummary {
        document_id: parse_uuid(0, document_id)?,
        content: row.get("content")?,
        source_word_count: row.get::<_, i64>("source_word_count")? as usize,
        summary_word_count: row.get::<_, i64>("summary_word_count")? as usize,
        generation_model: row.get("generation_model")?,
        created_at: parse_timestamp(5, created_at)?,
        updated_at: parse_timestamp(6, updated_at)?,
    })
}

fn row_to_job(row: &Row<'_>) -> rusqlite::Result<JobProgress> {
    let id: String = row.get("id")?;
    let document_id: String = row.get("document_id")?;
    let state: String = row.get("state")?;
    let stage: String = row.get("stage")?;
    let warnings: Option<String> = row.get("warnings")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;
    let completed_at: Option<String> = row.get("completed_at")?;

    Ok(JobProgress {
        id: parse_uuid(0, id)?,
        document_id: parse_uuid(1, document_id)?,
        state: JobState::parse(&state),
        stage: JobStage::parse(&stage),
        topic: row.get("topic")?,
        questions_requested: row.get::<_, i64>("questions_requested")? as u32,
        flashcards_requested: row.get::<_, i64>("flashcards_requested")? as u32,
        questions_generated: row.get::<_, i64>("questions_generated")? as u32,
        flashcards_generated: row.get::<_, i64>("flashcards_generated")? as u32,
        warnings: warnings
            .and_then(|w| serde_json::from_str(&w).ok())
            .unwrap_or_default(),
        error: row.get("error")?,
        created_at: parse_timestamp(12, created_at)?,
        updated_at: parse_timestamp(13, updated_at)?,
        completed_at: match completed_at {
            Some(t) => Some(parse_timestamp(14, t)?),
            None => None,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FileType;

    fn sample_document(filename: &str, hash: &str) -> Document {
        let mut doc = Document::new(
            filename.to_string(),
            FileType::Txt,
            hash.to_string(),
            1000,
        );
        doc.status = DocumentStatus::Ready;
        doc.text_length = 900;
        doc
    }

    fn sample_question(document_id: Uuid) -> Question {
        let now = Utc::now();
        Question {
            id: Uuid::new_v4(),
            document_id,
            prompt: "What is titration used for?".to_string(),
            kind: QuestionKind::MultipleChoice,
            difficulty: Difficulty::Medium,
            topic: Some("titration".to_string()),
            correct_answer: "Determining concentration".to_string(),
            explanation: Some("Covered in the procedure section".to_string()),
            options: vec![
                AnswerOption::new("Determining concentration".to_string(), true),
                AnswerOption::new("Measuring temperature".to_string(), false),
                AnswerOption::new("Separating mixtures".to_string(), false),
                AnswerOption::new("Observing color".to_string(), false),
            ],
            source_context: Some("Titration determines concentration.".to_string()),
            generation_model: Some("test-model".to_string()),
            status: QuestionStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn document_round_trip() {
        let db = Database::in_memory().unwrap();
        let doc = sample_document("lab1.txt", "hash-a");

        db.insert_document(&doc).unwrap();

        let loaded = db.get_document(&doc.id).unwrap().unwrap();
        assert_eq!(loaded.filename, "lab1.txt");
        assert_eq!(loaded.content_hash, "hash-a");
        assert_eq!(loaded.status, DocumentStatus::Ready);

        assert!(db.find_document_by_hash("hash-a").unwrap().is_some());
        assert!(db.find_document_by_hash("hash-b").unwrap().is_none());
        assert!(db.find_document_by_filename("lab1.txt").unwrap().is_some());
    }

    #[test]
    fn question_round_trip_with_options() {
        let db = Database::in_memory().unwrap();
        let doc = sample_document("lab1.txt", "hash-a");
        db.insert_document(&doc).unwrap();

        let question = sample_question(doc.id);
        db.insert_question(&question).unwrap();

        let loaded = db.get_question(&question.id).unwrap().unwrap();
        assert_eq!(loaded.options.len(), 4);
        assert_eq!(
            loaded.options.iter().filter(|o| o.is_correct).count(),
            1
        );
        assert_eq!(loaded.document_id, doc.id);

        let listed = db.list_questions_by_document(&doc.id).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].options.len(), 4);
    }

    #[test]
    fn deleting_document_cascades_to_questions() {
        let db = Database::in_memory().unwrap();
        let doc = sample_document("lab1.txt", "hash-a");
        db.insert_document(&doc).unwrap();
        db.insert_question(&sample_question(doc.id)).unwrap();

        assert_eq!(db.count_questions_for_document(&doc.id).unwrap(), 1);
        assert!(db.delete_document(&doc.id).unwrap());
        assert_eq!(db.count_questions_for_document(&doc.id).unwrap(), 0);
        assert!(db.get_document(&doc.id).unwrap().is_none());
    }

    #[test]
    fn question_update_replaces_options() {
        let db = Database::in_memory().unwrap();
        let doc = sample_document("lab1.txt", "hash-a");
        db.insert_document(&doc).unwrap();

        let mut question = sample_question(doc.id);
        db.insert_question(&question).unwrap();

        question.prompt = "Edited prompt".to_string();
        question.status = QuestionStatus::Approved;
        question.options = vec![
            AnswerOption::new("Yes".to_string(), true),
            AnswerOption::new("No".to_string(), false),
        ];
        db.update_question(&question).unwrap();

        let loaded = db.get_question(&question.id).unwrap().unwrap();
        assert_eq!(loaded.prompt, "Edited prompt");
        assert_eq!(loaded.status, QuestionStatus::Approved);
        assert_eq!(loaded.options.len(), 2);
    }

    #[test]
    fn job_round_trip() {
        let db = Database::in_memory().unwrap();
        let mut job = JobProgress::new(Uuid::new_v4(), Uuid::new_v4(), Some("acids".into()), 5, 2);

        db.insert_job(&job).unwrap();
        assert_eq!(db.list_incomplete_jobs().unwrap().len(), 1);

        job.state = JobState::Succeeded;
        job.stage = JobStage::Complete;
        job.questions_generated = 5;
        job.completed_at = Some(Utc::now());
        db.update_job(&job).unwrap();

        let loaded = db.get_job(&job.id).unwrap().unwrap();
        assert_eq!(loaded.state, JobState::Succeeded);
        assert_eq!(loaded.questions_generated, 5);
        assert!(db.list_incomplete_jobs().unwrap().is_empty());
    }

    #[test]
    fn summary_upsert_replaces_content() {
        let db = Database::in_memory().unwrap();
        let doc = sample_document("lab1.txt", "hash-a");
        db.insert_document(&doc).unwrap();

        let now = Utc::now();
        let mut summary = DocumentSummary {
            document_id: doc.id,
            content: "# First".to_string(),
            source_word_count: 100,
            summary_word_count: 10,
            generation_model: "test-model".to_string(),
            created_at: now,
            updated_at: now,
        };
        db.upsert_summary(&summary).unwrap();

        summary.content = "# Second".to_string();
        db.upsert_summary(&summary).unwrap();

        let loaded = db.get_summary(&doc.id).unwrap().unwrap();
        assert_eq!(loaded.content, "# Second");
    }
}
