//! Question, flashcard, and summary types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Question difficulty
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    /// Lenient parse, unknown values fall back to medium
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "easy" => Self::Easy,
            "hard" => Self::Hard,
            _ => Self::Medium,
        }
    }
}

/// Kind of generated question
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    #[default]
    MultipleChoice,
    ShortAnswer,
    TrueFalse,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MultipleChoice => "multiple_choice",
            Self::ShortAnswer => "short_answer",
            Self::TrueFalse => "true_false",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "short_answer" => Self::ShortAnswer,
            "true_false" => Self::TrueFalse,
            _ => Self::MultipleChoice,
        }
    }
}

/// Review status of a question
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuestionStatus {
    #[default]
    Draft,
    Approved,
}

impl QuestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Approved => "approved",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "approved" => Self::Approved,
            _ => Self::Draft,
        }
    }
}

/// One answer option attached to a question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOption {
    /// Unique option ID
    pub id: Uuid,
    /// Option text
    pub content: String,
    /// Whether this option is the correct answer
    pub is_correct: bool,
}

impl AnswerOption {
    pub fn new(content: String, is_correct: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            content,
            is_correct,
        }
    }
}

/// A generated (or manually created) quiz question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Unique question ID
    pub id: Uuid,
    /// Source document, exactly one per question
    pub document_id: Uuid,
    /// Question text
    pub prompt: String,
    /// Question kind
    pub kind: QuestionKind,
    /// Difficulty tag
    pub difficulty: Difficulty,
    /// Topic the question was generated for
    pub topic: Option<String>,
    /// Correct answer text
    pub correct_answer: String,
    /// Explanation for the answer
    pub explanation: Option<String>,
    /// Answer options
    pub options: Vec<AnswerOption>,
    /// Snapshot of the context the question was generated from
    pub source_context: Option<String>,
    /// Model that generated the question, absent for manual questions
    pub generation_model: Option<String>,
    /// Review status
    pub status: QuestionStatus,
    /// Creation timestamp
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Last edit timestamp
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// A generated two-sided study card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flashcard {
    /// Unique flashcard ID
    pub id: Uuid,
    /// Source document
    pub document_id: Uuid,
    /// Card type (definition, concept, process, example)
    pub card_type: String,
    /// Front side text
    pub front: String,
    /// Back side text
    pub back: String,
    /// Optional explanation
    pub explanation: Option<String>,
    /// Topic the card was generated for
    pub topic: Option<String>,
    /// Model that generated the card
    pub generation_model: Option<String>,
    /// Creation timestamp
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// LLM-written study summary for one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// The summarized document
    pub document_id: Uuid,
    /// Markdown summary content
    pub content: String,
    /// Word count of the source text
    pub source_word_count: usize,
    /// Word count of the summary
    pub summary_word_count: usize,
    /// Model that wrote the summary
    pub generation_model: String,
    /// Creation timestamp
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Last regeneration timestamp
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
