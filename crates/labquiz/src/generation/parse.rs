//! Parsing model responses into typed items
//!
//! Models do not always return clean JSON. Recovery is layered: strip code
//! fences, try the whole response, then fall back to extracting the first
//! JSON array or object from surrounding prose. Invalid items are skipped,
//! never fatal.

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

/// A quiz question as emitted by the model
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedQuestion {
    #[serde(default)]
    pub question: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub difficulty_level: Option<String>,
    #[serde(default)]
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub options: Vec<String>,
}

impl GeneratedQuestion {
    /// A usable question has text, an answer, and at least two options
    pub fn is_valid(&self) -> bool {
        !self.question.trim().is_empty()
            && !self.correct_answer.trim().is_empty()
            && self.options.len() >= 2
    }
}

/// A flashcard as emitted by the model
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedFlashcard {
    #[serde(default, rename = "type")]
    pub card_type: Option<String>,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl GeneratedFlashcard {
    pub fn is_valid(&self) -> bool {
        !self.question.trim().is_empty() && !self.answer.trim().is_empty()
    }
}

/// Extract JSON values from a model response
pub fn extract_json_items(response: &str) -> Vec<Value> {
    if response.trim().is_empty() {
        return Vec::new();
    }

    // Remove code block markers
    let fence = Regex::new(r"```(?:json)?").unwrap();
    let text = fence.replace_all(response, "");
    let text = text.trim();

    // Direct parse first
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return flatten(value);
    }

    // Extract an embedded array, then an embedded object
    for pattern in [r"(?s)\[.*\]", r"(?s)\{.*\}"] {
        let re = Regex::new(pattern).unwrap();
        if let Some(m) = re.find(text) {
            if let Ok(value) = serde_json::from_str::<Value>(m.as_str()) {
                return flatten(value);
            }
        }
    }

    Vec::new()
}

fn flatten(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        _ => Vec::new(),
    }
}

/// Parse and validate quiz questions from a model response
pub fn parse_questions(response: &str) -> Vec<GeneratedQuestion> {
    extract_json_items(response)
        .into_iter()
        .filter_map(|item| serde_json::from_value::<GeneratedQuestion>(item).ok())
        .filter(|q| q.is_valid())
        .collect()
}

/// Parse and validate flashcards from a model response
pub fn parse_flashcards(response: &str) -> Vec<GeneratedFlashcard> {
    extract_json_items(response)
        .into_iter()
        .filter_map(|item| serde_json::from_value::<GeneratedFlashcard>(item).ok())
        .filter(|f| f.is_valid())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLEAN: &str = r#"[
        {"question": "What does a burette measure?", "type": "multiple_choice",
         "difficulty_level": "easy", "correct_answer": "Volume",
         "explanation": "Burettes dispense measured volumes.",
         "options": ["Volume", "Mass", "Temperature", "Pressure"]}
    ]"#;

    #[test]
    fn parses_clean_json_array() {
        let questions = parse_questions(CLEAN);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].correct_answer, "Volume");
        assert_eq!(questions[0].options.len(), 4);
    }

    #[test]
    fn strips_code_fences() {
        let fenced = format!("```json\n{}\n```", CLEAN);
        assert_eq!(parse_questions(&fenced).len(), 1);
    }

    #[test]
    fn recovers_array_from_surrounding_prose() {
        let noisy = format!("Here are your questions:\n{}\nLet me know if you need more.", CLEAN);
        assert_eq!(parse_questions(&noisy).len(), 1);
    }

    #[test]
    fn single_object_becomes_one_item() {
        let single = r#"{"question": "Define molarity", "answer": "Moles per liter"}"#;
        let cards = parse_flashcards(single);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].answer, "Moles per liter");
    }

    #[test]
    fn invalid_items_are_skipped() {
        let mixed = r#"[
            {"question": "Valid?", "correct_answer": "Yes", "options": ["Yes", "No"]},
            {"question": "Missing answer", "options": ["A", "B"]},
            {"question": "Too few options", "correct_answer": "A", "options": ["A"]}
        ]"#;
        let questions = parse_questions(mixed);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].question, "Valid?");
    }

    #[test]
    fn garbage_yields_nothing() {
        assert!(parse_questions("I could not generate questions.").is_empty());
        assert!(parse_questions("").is_empty());
    }

    #[test]
    fn flashcards_require_both_sides() {
        let cards = parse_flashcards(
            r#"[{"type": "concept_flashcard", "question": "Front only", "answer": ""}]"#,
        );
        assert!(cards.is_empty());
    }
}
