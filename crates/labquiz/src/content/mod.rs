//! Content processing: extraction, chunking, and context selection

mod chunker;
mod extractor;
mod selector;

pub use chunker::{ContentChunk, TextChunker};
pub use extractor::{ExtractedText, TextExtractor};
pub use selector::ContextSelector;
