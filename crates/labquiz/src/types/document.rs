//! Document types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Supported file types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Microsoft Word document (.docx)
    Docx,
    /// Plain text file
    Txt,
    /// Markdown file
    Markdown,
    /// HTML document
    Html,
    /// CSV file
    Csv,
    /// Unknown file type
    Unknown,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            "txt" | "text" => Self::Txt,
            "md" | "markdown" => Self::Markdown,
            "html" | "htm" => Self::Html,
            "csv" => Self::Csv,
            _ => Self::Unknown,
        }
    }

    /// Detect file type from a filename
    pub fn from_filename(filename: &str) -> Self {
        let ext = filename.rsplit('.').next().unwrap_or("");
        Self::from_extension(ext)
    }

    /// Check if this is a supported file type
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Get display name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Pdf => "PDF",
            Self::Docx => "Word Document (.docx)",
            Self::Txt => "Text File",
            Self::Markdown => "Markdown",
            Self::Html => "HTML",
            Self::Csv => "CSV",
            Self::Unknown => "Unknown",
        }
    }

    /// Canonical extension for stored blobs
    pub fn extension(&self) -> &str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Txt => "txt",
            Self::Markdown => "md",
            Self::Html => "html",
            Self::Csv => "csv",
            Self::Unknown => "bin",
        }
    }
}

/// Processing status of an uploaded document
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Uploaded, text extraction in progress
    Processing,
    /// Text extracted and stored, ready for generation
    Ready,
    /// Extraction or storage failed
    Failed,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "ready" => Self::Ready,
            "failed" => Self::Failed,
            _ => Self::Processing,
        }
    }
}

/// An uploaded document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// Original filename as uploaded
    pub filename: String,
    /// File type
    pub file_type: FileType,
    /// Content hash of the extracted text, for deduplication
    pub content_hash: String,
    /// Raw file size in bytes
    pub file_size: u64,
    /// Length of the extracted text in characters
    pub text_length: usize,
    /// Total number of pages (if applicable)
    pub total_pages: Option<u32>,
    /// Processing status
    pub status: DocumentStatus,
    /// Storage URI of the raw blob
    pub storage_uri: Option<String>,
    /// Storage URI of the extracted plain text
    pub content_uri: Option<String>,
    /// Upload timestamp
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
    /// Last modification timestamp
    pub updated_at: chrono::DateTime<chrono::Utc>,
    /// Additional metadata
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Document {
    /// Create a new document record in the processing state
    pub fn new(filename: String, file_type: FileType, content_hash: String, file_size: u64) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: Uuid::new_v4(),
            filename,
            file_type,
            content_hash,
            file_size,
            text_length: 0,
            total_pages: None,
            status: DocumentStatus::Processing,
            storage_uri: None,
            content_uri: None,
            uploaded_at: now,
            updated_at: now,
            metadata: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_file_type_from_filename() {
        assert_eq!(FileType::from_filename("lab1.pdf"), FileType::Pdf);
        assert_eq!(FileType::from_filename("notes.MD"), FileType::Markdown);
        assert_eq!(FileType::from_filename("data.csv"), FileType::Csv);
        assert_eq!(FileType::from_filename("archive.tar.gz"), FileType::Unknown);
        assert!(!FileType::from_filename("video.mp4").is_supported());
    }
}
