//! labquiz: question generation service for lab documents
//!
//! Upload a lab document (PDF, DOCX, text, Markdown, HTML, CSV), let the
//! service extract and chunk its text, and generate quiz questions and
//! flashcards from it with an OpenAI-compatible LLM. Results are persisted
//! in SQLite and served over an HTTP API with draft/approve editing.

pub mod config;
pub mod content;
pub mod error;
pub mod generation;
pub mod processing;
pub mod server;
pub mod storage;
pub mod types;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use types::{Document, DocumentStatus, Flashcard, Question, QuestionStatus};
