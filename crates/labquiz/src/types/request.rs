//! API request types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::question::{Difficulty, QuestionKind, QuestionStatus};

/// Request to generate questions and flashcards for a document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Source document
    pub document_id: Uuid,
    /// Optional topic to focus context selection on
    #[serde(default)]
    pub topic: Option<String>,
    /// Number of quiz questions to generate
    #[serde(default)]
    pub question_count: u32,
    /// Number of flashcards to generate
    #[serde(default)]
    pub flashcard_count: u32,
    /// Difficulty tag applied when the model does not supply one
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
}

/// Request to create a question manually
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionCreateRequest {
    pub document_id: Uuid,
    pub prompt: String,
    #[serde(default)]
    pub kind: QuestionKind,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub topic: Option<String>,
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: Option<String>,
    /// Option texts; the correct answer must be one of them for multiple choice
    #[serde(default)]
    pub options: Vec<String>,
}

/// Partial update of a question; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionUpdateRequest {
    pub prompt: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub topic: Option<String>,
    pub correct_answer: Option<String>,
    pub explanation: Option<String>,
    pub status: Option<QuestionStatus>,
    /// Replaces all options when present
    pub options: Option<Vec<String>>,
}

/// Request to create a flashcard manually
#[derive(Debug, Clone, Deserialize)]
pub struct FlashcardCreateRequest {
    pub document_id: Uuid,
    #[serde(default = "default_card_type")]
    pub card_type: String,
    pub front: String,
    pub back: String,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
}

fn default_card_type() -> String {
    "concept_flashcard".to_string()
}

/// Partial update of a flashcard
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlashcardUpdateRequest {
    pub card_type: Option<String>,
    pub front: Option<String>,
    pub back: Option<String>,
    pub explanation: Option<String>,
    pub topic: Option<String>,
}

/// Rename an uploaded document
#[derive(Debug, Clone, Deserialize)]
pub struct RenameRequest {
    pub new_filename: String,
}
