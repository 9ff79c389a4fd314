//! Core types for the question generation service

pub mod document;
pub mod question;
pub mod request;
pub mod response;

pub use document::{Document, DocumentStatus, FileType};
pub use question::{
    AnswerOption, Difficulty, DocumentSummary, Flashcard, Question, QuestionKind, QuestionStatus,
};
pub use request::{
    FlashcardCreateRequest, FlashcardUpdateRequest, GenerateRequest, QuestionCreateRequest,
    QuestionUpdateRequest, RenameRequest,
};
pub use response::{GenerateAccepted, MessageResponse, UploadResponse};
