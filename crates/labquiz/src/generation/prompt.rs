//! Prompt templates for question, flashcard, and summary generation

/// Prompt builder for generation calls
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the quiz question prompt
    pub fn questions(topic: &str, context: &str, target_count: u32) -> String {
        format!(
            r#"Generate EXACTLY {target_count} quiz questions as a JSON array. Be fast and efficient.

Topic: {topic}
Context: {context}

OUTPUT RULES:
- Valid JSON array only
- No extra text
- All fields required

STRUCTURE:
[{{"question": "...", "type": "multiple_choice", "difficulty_level": "medium", "correct_answer": "...", "explanation": "...", "options": ["A", "B", "C", "D"]}}]

QUALITY:
- Questions from context only
- Clear and direct
- 4 options for multiple choice

Generate {target_count} questions:"#,
            target_count = target_count,
            topic = topic,
            context = context,
        )
    }

    /// Build the flashcard prompt
    pub fn flashcards(topic: &str, context: &str, target_count: u32) -> String {
        format!(
            r#"Generate EXACTLY {target_count} flashcards as a JSON array. Be fast and efficient.

Topic: {topic}
Context: {context}

OUTPUT RULES:
- Valid JSON array only
- No extra text
- All fields required

STRUCTURE:
[{{"type": "concept_flashcard", "question": "...", "answer": "...", "explanation": "..."}}]

TYPES: definition_flashcard, concept_flashcard, process_flashcard, example_flashcard

Generate {target_count} flashcards:"#,
            target_count = target_count,
            topic = topic,
            context = context,
        )
    }

    /// Build the study summary prompt
    pub fn summary(filename: &str, content: &str) -> String {
        format!(
            r#"Create a comprehensive study summary for the document "{filename}".

DOCUMENT CONTENT:
{content}

Generate a well-structured summary with:
- Key terms and definitions
- Main concepts and ideas
- Important facts and data
- Exam preparation highlights

Use Markdown formatting with headings, bullet points, **bold** for key terms, and proper spacing.
Write in the same language as the content. Keep it concise (800-1200 words).

Write an exam-focused summary:"#,
            filename = filename,
            content = content,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_prompt_carries_count_and_context() {
        let prompt = PromptBuilder::questions("acids", "HCl is a strong acid.", 7);
        assert!(prompt.contains("EXACTLY 7 quiz questions"));
        assert!(prompt.contains("Topic: acids"));
        assert!(prompt.contains("HCl is a strong acid."));
    }

    #[test]
    fn flashcard_prompt_lists_card_types() {
        let prompt = PromptBuilder::flashcards("bases", "NaOH dissolves in water.", 3);
        assert!(prompt.contains("EXACTLY 3 flashcards"));
        assert!(prompt.contains("definition_flashcard"));
    }
}
