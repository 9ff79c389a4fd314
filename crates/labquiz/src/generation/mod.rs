//! Question and flashcard generation via an external LLM

mod client;
mod parse;
mod prompt;

pub use client::{GenerationProvider, OpenAiClient};
pub use parse::{
    extract_json_items, parse_flashcards, parse_questions, GeneratedFlashcard, GeneratedQuestion,
};
pub use prompt::PromptBuilder;
