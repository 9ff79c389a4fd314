//! Text chunking with sentence-aware boundaries

use unicode_segmentation::UnicodeSegmentation;

/// A chunk of extracted document text
#[derive(Debug, Clone)]
pub struct ContentChunk {
    /// Chunk index within the document
    pub index: u32,
    /// Text content
    pub text: String,
    /// Character position in the source text
    pub char_start: usize,
    pub char_end: usize,
}

/// Text chunker with configurable size and overlap
pub struct TextChunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap between chunks
    overlap: usize,
    /// Minimum chunk size
    min_size: usize,
}

impl TextChunker {
    /// Create a new chunker
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap,
            min_size: 50,
        }
    }

    /// Override the minimum chunk size
    pub fn with_min_size(mut self, min_size: usize) -> Self {
        self.min_size = min_size;
        self
    }

    /// Split text into overlapping chunks at sentence boundaries
    pub fn chunk(&self, text: &str) -> Vec<ContentChunk> {
        let mut chunks = Vec::new();
        let sentences: Vec<&str> = text.split_sentence_bounds().collect();

        let mut current = String::new();
        let mut current_start = 0usize;
        let mut chunk_index = 0u32;
        let mut char_pos = 0usize;

        for sentence in sentences {
            let sentence_len = sentence.len();

            if !current.is_empty() && current.len() + sentence_len > self.chunk_size {
                if current.trim().len() >= self.min_size {
                    chunks.push(ContentChunk {
                        index: chunk_index,
                        text: current.trim().to_string(),
                        char_start: current_start,
                        char_end: char_pos,
                    });
                    chunk_index += 1;
                }

                let overlap_text = self.overlap_tail(&current);
                current = overlap_text;
                current_start = char_pos.saturating_sub(self.overlap);
            }

            current.push_str(sentence);
            char_pos += sentence_len;
        }

        if current.trim().len() >= self.min_size {
            chunks.push(ContentChunk {
                index: chunk_index,
                text: current.trim().to_string(),
                char_start: current_start,
                char_end: char_pos,
            });
        }

        chunks
    }

    /// Take the overlap-sized tail of a chunk, preferring a sentence start
    fn overlap_tail(&self, text: &str) -> String {
        if self.overlap == 0 {
            return String::new();
        }
        if text.len() <= self.overlap {
            return text.to_string();
        }

        let mut start = text.len().saturating_sub(self.overlap);
        while start > 0 && !text.is_char_boundary(start) {
            start -= 1;
        }

        let tail = &text[start..];

        if let Some(pos) = tail.find(". ") {
            return tail[pos + 2..].to_string();
        }
        if let Some(pos) = tail.find(' ') {
            return tail[pos + 1..].to_string();
        }

        tail.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_text(sentences: usize) -> String {
        (0..sentences)
            .map(|i| format!("Sentence number {} describes one step of the procedure. ", i))
            .collect()
    }

    #[test]
    fn short_text_is_one_chunk() {
        let chunker = TextChunker::new(1000, 100);
        let chunks = chunker.chunk("A single short paragraph about lab safety procedures.");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].index, 0);
    }

    #[test]
    fn long_text_is_split_with_overlap() {
        let chunker = TextChunker::new(300, 60);
        let text = sample_text(30);
        let chunks = chunker.chunk(&text);

        assert!(chunks.len() > 2);
        for chunk in &chunks {
            assert!(chunk.text.len() <= 300 + 60 + 60);
        }
        // Indices are sequential
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i as u32);
        }
    }

    #[test]
    fn tiny_fragments_are_dropped() {
        let chunker = TextChunker::new(1000, 0);
        let chunks = chunker.chunk("Too small.");
        assert!(chunks.is_empty());
    }

    #[test]
    fn chunk_boundaries_fall_on_char_boundaries() {
        let chunker = TextChunker::new(80, 20);
        let text = "Häufig genutzte Reagenzien müssen gekühlt werden. ".repeat(10);
        // Must not panic on multi-byte characters
        let chunks = chunker.chunk(&text);
        assert!(!chunks.is_empty());
    }
}
