//! Context selection for generation requests
//!
//! Scores chunks by token overlap with the requested topic and assembles the
//! best ones into a bounded context string. With no topic the document is
//! taken front to back.

use std::collections::HashSet;

use super::chunker::ContentChunk;

/// Separator between chunks in the assembled context
const CONTEXT_SEPARATOR: &str = "\n\n";

/// Selects which chunks are handed to the generation service
pub struct ContextSelector {
    /// Maximum characters in the assembled context
    max_chars: usize,
    /// Contexts shorter than this are treated as empty
    min_chars: usize,
}

impl ContextSelector {
    pub fn new(max_chars: usize, min_chars: usize) -> Self {
        Self {
            max_chars,
            min_chars,
        }
    }

    /// Assemble context for a topic, empty string when nothing relevant exists
    pub fn select(&self, topic: Option<&str>, chunks: &[ContentChunk]) -> String {
        let ranked: Vec<&ContentChunk> = match topic.map(tokenize) {
            Some(topic_tokens) if !topic_tokens.is_empty() => {
                let mut scored: Vec<(usize, &ContentChunk)> = chunks
                    .iter()
                    .map(|chunk| (score_chunk(&topic_tokens, &chunk.text), chunk))
                    .filter(|(score, _)| *score > 0)
                    .collect();

                // Highest score first, document order as tie-breaker
                scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.index.cmp(&b.1.index)));
                scored.into_iter().map(|(_, c)| c).collect()
            }
            _ => chunks.iter().collect(),
        };

        let mut selected: Vec<&ContentChunk> = Vec::new();
        let mut total = 0usize;

        for chunk in ranked {
            let added = chunk.text.len() + CONTEXT_SEPARATOR.len();
            if total + added > self.max_chars && !selected.is_empty() {
                continue;
            }
            if chunk.text.len() > self.max_chars {
                // A single oversized chunk is truncated at a char boundary
                let mut end = self.max_chars;
                while end > 0 && !chunk.text.is_char_boundary(end) {
                    end -= 1;
                }
                let mut truncated = chunk.text[..end].to_string();
                truncated.push_str("\n[Content truncated]");
                return truncated;
            }
            total += added;
            selected.push(chunk);
        }

        // Present selected chunks in document order
        selected.sort_by_key(|c| c.index);

        let context = selected
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR);

        if context.len() < self.min_chars {
            String::new()
        } else {
            context
        }
    }
}

/// Common words that carry no topical signal
const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "that", "this", "from", "are", "was", "were", "what", "which",
    "how", "about", "into", "over", "all", "each", "has", "have", "its",
];

/// Lowercased alphanumeric tokens, stop-words and short words dropped
fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 2)
        .map(|t| t.to_lowercase())
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .collect()
}

/// Number of topic token occurrences in the chunk
fn score_chunk(topic_tokens: &HashSet<String>, text: &str) -> usize {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 2)
        .filter(|t| topic_tokens.contains(&t.to_lowercase()))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(index: u32, text: &str) -> ContentChunk {
        ContentChunk {
            index,
            text: text.to_string(),
            char_start: 0,
            char_end: text.len(),
        }
    }

    #[test]
    fn topic_chunks_are_preferred() {
        let chunks = vec![
            chunk(0, "General introduction to the laboratory course and grading policy for the semester."),
            chunk(1, "Titration procedure: fill the burette with sodium hydroxide and titrate the acid sample."),
            chunk(2, "Cleanup instructions for glassware after each laboratory session has finished."),
        ];

        let selector = ContextSelector::new(200, 10);
        let context = selector.select(Some("titration of the acid"), &chunks);

        assert!(context.contains("Titration procedure"));
        assert!(!context.contains("grading policy"));
    }

    #[test]
    fn no_topic_takes_leading_chunks() {
        let chunks = vec![
            chunk(0, "First part of the document with enough text to pass the minimum size check."),
            chunk(1, "Second part of the document, also long enough to matter for this test case."),
        ];

        let selector = ContextSelector::new(90, 10);
        let context = selector.select(None, &chunks);

        assert!(context.starts_with("First part"));
        assert!(!context.contains("Second part"));
    }

    #[test]
    fn unrelated_topic_yields_empty_context() {
        let chunks = vec![chunk(
            0,
            "Prepare the agar plates and incubate the bacterial cultures overnight at 37 degrees.",
        )];

        let selector = ContextSelector::new(500, 10);
        let context = selector.select(Some("quantum electrodynamics"), &chunks);
        assert!(context.is_empty());
    }

    #[test]
    fn selected_chunks_keep_document_order() {
        let chunks = vec![
            chunk(0, "Step one mentions the reagent once during setup of the apparatus stand."),
            chunk(1, "Irrelevant housekeeping paragraph about lockers and coat storage rules here."),
            chunk(2, "Step two mentions the reagent twice: add reagent slowly, stir the reagent."),
        ];

        let selector = ContextSelector::new(400, 10);
        let context = selector.select(Some("reagent"), &chunks);

        let first = context.find("Step one").unwrap();
        let second = context.find("Step two").unwrap();
        assert!(first < second);
    }

    #[test]
    fn oversized_single_chunk_is_truncated() {
        let long = "word ".repeat(200);
        let chunks = vec![chunk(0, &long)];

        let selector = ContextSelector::new(100, 10);
        let context = selector.select(None, &chunks);

        assert!(context.len() <= 100 + "\n[Content truncated]".len());
        assert!(context.ends_with("[Content truncated]"));
    }
}
