//! Configuration for the question generation service

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Environment variable naming the optional TOML config file
pub const CONFIG_PATH_VAR: &str = "LABQUIZ_CONFIG";

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage locations
    #[serde(default)]
    pub storage: StorageConfig,
    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Generation service (LLM) configuration
    #[serde(default)]
    pub llm: LlmConfig,
    /// Question generation limits and context sizing
    #[serde(default)]
    pub generation: GenerationConfig,
    /// Background processing configuration
    #[serde(default)]
    pub processing: ProcessingConfig,
}

impl AppConfig {
    /// Load configuration: defaults, then an optional TOML file named by
    /// `LABQUIZ_CONFIG`, then environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) => {
                let raw = std::fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!("Failed to read config file '{}': {}", path, e))
                })?;
                toml::from_str(&raw).map_err(|e| {
                    Error::Config(format!("Failed to parse config file '{}': {}", path, e))
                })?
            }
            Err(_) => Self::default(),
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides on top of file/default values
    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("LABQUIZ_API_KEY") {
            if !key.is_empty() {
                self.llm.api_key = Some(key);
            }
        }
        if let Ok(url) = std::env::var("LABQUIZ_BASE_URL") {
            if !url.is_empty() {
                self.llm.base_url = url;
            }
        }
        if let Ok(model) = std::env::var("LABQUIZ_MODEL") {
            if !model.is_empty() {
                self.llm.model = model;
            }
        }
        if let Ok(port) = std::env::var("LABQUIZ_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(dir) = std::env::var("LABQUIZ_DATA_DIR") {
            if !dir.is_empty() {
                self.storage.data_dir = PathBuf::from(dir);
            }
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 100MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 100 * 1024 * 1024,
        }
    }
}

/// Storage locations for the database and document files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base data directory; blobs, extracted text, and the database live under it
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
            .join("labquiz");
        Self { data_dir }
    }
}

impl StorageConfig {
    /// Path of the SQLite database file
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("labquiz.db")
    }

    /// Directory for stored document files
    pub fn documents_dir(&self) -> PathBuf {
        self.data_dir.join("documents")
    }
}

/// Text chunking configuration
///
/// Chunk size and overlap scale with document length when `adaptive` is set,
/// so short lab handouts get small chunks and long manuals get larger ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Fixed chunk size in characters (used when adaptive sizing is off)
    pub chunk_size: usize,
    /// Overlap between chunks in characters
    pub chunk_overlap: usize,
    /// Minimum chunk size (smaller chunks are dropped)
    pub min_chunk_size: usize,
    /// Scale chunk size with document length
    #[serde(default = "default_adaptive")]
    pub adaptive: bool,
    /// Documents shorter than this are "small" (chars)
    #[serde(default = "default_small_threshold")]
    pub small_doc_threshold: usize,
    /// Documents shorter than this are "medium" (chars)
    #[serde(default = "default_medium_threshold")]
    pub medium_doc_threshold: usize,
    /// Documents shorter than this are "large" (chars)
    #[serde(default = "default_large_threshold")]
    pub large_doc_threshold: usize,
}

fn default_adaptive() -> bool {
    true
}
fn default_small_threshold() -> usize {
    2_000
}
fn default_medium_threshold() -> usize {
    8_000
}
fn default_large_threshold() -> usize {
    20_000
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1500,
            chunk_overlap: 150,
            min_chunk_size: 50,
            adaptive: true,
            small_doc_threshold: 2_000,
            medium_doc_threshold: 8_000,
            large_doc_threshold: 20_000,
        }
    }
}

impl ChunkingConfig {
    /// Chunk size and overlap for a document of the given length
    pub fn sizes_for_length(&self, text_len: usize) -> (usize, usize) {
        if !self.adaptive {
            return (self.chunk_size, self.chunk_overlap);
        }
        if text_len < self.small_doc_threshold {
            (800, 100)
        } else if text_len < self.medium_doc_threshold {
            (1500, 150)
        } else if text_len < self.large_doc_threshold {
            (2500, 200)
        } else {
            (3500, 300)
        }
    }
}

/// Generation service (LLM) configuration
///
/// Points at any OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the generation API
    pub base_url: String,
    /// API key (usually from `LABQUIZ_API_KEY`)
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model name
    pub model: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Maximum tokens per completion
    pub max_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            api_key: None,
            model: "deepseek/deepseek-r1-0528:free".to_string(),
            temperature: 0.2,
            max_tokens: 3500,
            timeout_secs: 120,
            max_retries: 3,
        }
    }
}

/// Question generation limits and context sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Maximum questions a single request may ask for
    pub max_questions_per_request: u32,
    /// Maximum flashcards a single request may ask for
    pub max_flashcards_per_request: u32,
    /// Questions requested per LLM call
    pub questions_per_batch: u32,
    /// Flashcards requested per LLM call
    pub flashcards_per_batch: u32,
    /// Maximum characters of context handed to one generation call
    pub max_context_chars: usize,
    /// Minimum context length worth generating from
    pub min_context_chars: usize,
    /// Maximum topic length in characters
    pub max_topic_chars: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_questions_per_request: 30,
            max_flashcards_per_request: 30,
            questions_per_batch: 15,
            flashcards_per_batch: 15,
            max_context_chars: 3_000,
            min_context_chars: 100,
            max_topic_chars: 100,
        }
    }
}

/// Background processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Timeout for a single generation job in seconds
    pub job_timeout_secs: u64,
    /// Capacity of the job submission channel
    pub queue_capacity: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            job_timeout_secs: 300,
            queue_capacity: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adaptive_sizes_scale_with_length() {
        let cfg = ChunkingConfig::default();
        assert_eq!(cfg.sizes_for_length(500), (800, 100));
        assert_eq!(cfg.sizes_for_length(5_000), (1500, 150));
        assert_eq!(cfg.sizes_for_length(15_000), (2500, 200));
        assert_eq!(cfg.sizes_for_length(50_000), (3500, 300));
    }

    #[test]
    fn fixed_sizes_when_adaptive_off() {
        let cfg = ChunkingConfig {
            adaptive: false,
            chunk_size: 1234,
            chunk_overlap: 99,
            ..Default::default()
        };
        assert_eq!(cfg.sizes_for_length(50_000), (1234, 99));
    }
}
