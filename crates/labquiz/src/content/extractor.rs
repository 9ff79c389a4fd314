//! Multi-format text extraction

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::types::FileType;

/// Normalized text extracted from an uploaded file
#[derive(Debug, Clone)]
pub struct ExtractedText {
    /// Detected file type
    pub file_type: FileType,
    /// Normalized text content
    pub content: String,
    /// Content hash for deduplication
    pub content_hash: String,
    /// Total pages (if applicable)
    pub total_pages: Option<u32>,
}

/// Multi-format text extractor
///
/// Extraction is pure: the same bytes always produce the same text and hash.
pub struct TextExtractor;

impl TextExtractor {
    /// Extract normalized text from a file based on its extension
    pub fn extract(filename: &str, data: &[u8]) -> Result<ExtractedText> {
        let file_type = FileType::from_filename(filename);

        if !file_type.is_supported() {
            let ext = filename.rsplit('.').next().unwrap_or("");
            return Err(Error::UnsupportedFileType(ext.to_string()));
        }

        let (content, total_pages) = match file_type {
            FileType::Pdf => Self::extract_pdf(filename, data)?,
            FileType::Docx => (Self::extract_docx(filename, data)?, None),
            FileType::Txt => (Self::extract_plain(data), None),
            FileType::Markdown => (Self::extract_markdown(data), None),
            FileType::Html => (Self::extract_html(data), None),
            FileType::Csv => (Self::extract_csv(filename, data)?, None),
            FileType::Unknown => unreachable!("rejected above"),
        };

        let content = normalize_whitespace(&content);
        if content.is_empty() {
            return Err(Error::extraction(
                filename,
                "No text content could be extracted",
            ));
        }

        Ok(ExtractedText {
            file_type,
            content_hash: hash_content(&content),
            content,
            total_pages,
        })
    }

    /// Extract PDF text, page count via lopdf
    fn extract_pdf(filename: &str, data: &[u8]) -> Result<(String, Option<u32>)> {
        let content = pdf_extract::extract_text_from_mem(data)
            .map_err(|e| Error::extraction(filename, e.to_string()))?;

        let content = content.replace('\0', "");
        if content.trim().is_empty() {
            return Err(Error::extraction(
                filename,
                "PDF has no extractable text, it may be image-based or encrypted",
            ));
        }

        let total_pages = match lopdf::Document::load_mem(data) {
            Ok(doc) => Some(doc.get_pages().len() as u32),
            Err(_) => Some(1),
        };

        Ok((content, total_pages))
    }

    /// Extract DOCX paragraph text
    fn extract_docx(filename: &str, data: &[u8]) -> Result<String> {
        let doc = docx_rs::read_docx(data)
            .map_err(|e| Error::extraction(filename, e.to_string()))?;

        let mut content = String::new();
        for child in doc.document.children {
            if let docx_rs::DocumentChild::Paragraph(p) = child {
                for child in p.children {
                    if let docx_rs::ParagraphChild::Run(run) = child {
                        for child in run.children {
                            if let docx_rs::RunChild::Text(t) = child {
                                content.push_str(&t.text);
                            }
                        }
                    }
                }
                content.push('\n');
            }
        }

        Ok(content)
    }

    /// Plain text passes through
    fn extract_plain(data: &[u8]) -> String {
        String::from_utf8_lossy(data).into_owned()
    }

    /// Markdown with markup stripped to plain text
    fn extract_markdown(data: &[u8]) -> String {
        use pulldown_cmark::{Event, Parser, TagEnd};

        let raw = String::from_utf8_lossy(data);
        let mut content = String::new();

        for event in Parser::new(&raw) {
            match event {
                Event::Text(text) | Event::Code(text) => content.push_str(&text),
                Event::SoftBreak | Event::HardBreak => content.push('\n'),
                Event::End(TagEnd::Paragraph)
                | Event::End(TagEnd::Heading(_))
                | Event::End(TagEnd::Item) => content.push('\n'),
                _ => {}
            }
        }

        content
    }

    /// HTML body text
    fn extract_html(data: &[u8]) -> String {
        let html = String::from_utf8_lossy(data);
        let document = scraper::Html::parse_document(&html);

        let body_selector = scraper::Selector::parse("body").unwrap();
        let mut content = String::new();

        if let Some(body) = document.select(&body_selector).next() {
            for text in body.text() {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    if !content.is_empty() {
                        content.push(' ');
                    }
                    content.push_str(trimmed);
                }
            }
        }

        content
    }

    /// CSV rows flattened to pipe-separated lines
    fn extract_csv(filename: &str, data: &[u8]) -> Result<String> {
        let mut reader = csv::Reader::from_reader(data);
        let mut content = String::new();

        if let Ok(headers) = reader.headers() {
            content.push_str(&headers.iter().collect::<Vec<_>>().join(" | "));
            content.push('\n');
        }

        for result in reader.records() {
            let record =
                result.map_err(|e| Error::extraction(filename, e.to_string()))?;
            content.push_str(&record.iter().collect::<Vec<_>>().join(" | "));
            content.push('\n');
        }

        Ok(content)
    }
}

/// Collapse runs of blank lines and trim trailing whitespace per line
fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0usize;

    for line in text.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
            out.push('\n');
        } else {
            blank_run = 0;
            out.push_str(line);
            out.push('\n');
        }
    }

    out.trim().to_string()
}

/// Hash content for deduplication
fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_extraction_is_deterministic() {
        let data = b"Procedure\n\n\n\nMeasure 25 mL of the acid.  \n";
        let a = TextExtractor::extract("lab.txt", data).unwrap();
        let b = TextExtractor::extract("lab.txt", data).unwrap();

        assert_eq!(a.content, b.content);
        assert_eq!(a.content_hash, b.content_hash);
        assert_eq!(a.content, "Procedure\n\nMeasure 25 mL of the acid.");
    }

    #[test]
    fn markdown_markup_is_stripped() {
        let data = b"# Safety\n\nWear **goggles** at `all` times.\n";
        let extracted = TextExtractor::extract("safety.md", data).unwrap();

        assert!(extracted.content.contains("Safety"));
        assert!(extracted.content.contains("Wear goggles at all times."));
        assert!(!extracted.content.contains('#'));
        assert!(!extracted.content.contains("**"));
    }

    #[test]
    fn html_body_text_only() {
        let data =
            b"<html><head><title>x</title></head><body><p>Mix the <b>solution</b>.</p></body></html>";
        let extracted = TextExtractor::extract("page.html", data).unwrap();
        assert_eq!(extracted.content, "Mix the solution .");
    }

    #[test]
    fn csv_rows_become_lines() {
        let data = b"reagent,volume\nHCl,25\nNaOH,30\n";
        let extracted = TextExtractor::extract("reagents.csv", data).unwrap();
        assert!(extracted.content.contains("reagent | volume"));
        assert!(extracted.content.contains("HCl | 25"));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = TextExtractor::extract("video.mp4", b"data").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFileType(_)));
    }

    #[test]
    fn empty_content_is_an_extraction_error() {
        let err = TextExtractor::extract("empty.txt", b"   \n  \n").unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));
    }
}
