//! Configuration for the Extractor

use crate::error::ExtractorError;
use serde::{Deserialize, Serialize};

/// Approximate characters per model token
pub const TOKEN_TO_CHAR_RATIO: usize = 4;

/// Default separators: paragraph breaks first, then sentence-ending
/// punctuation across scripts
pub const DEFAULT_SEPARATORS: &[&str] = &[
    // Paragraph and page separators
    "\n\n\n", "\n\n", "\r\n\r\n",
    // Sentence ending punctuation
    "。", "．", ".", "！", "!", "？", "?",
];

fn default_separators() -> Vec<String> {
    DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect()
}

fn default_chunk_token_size() -> usize {
    800
}

fn default_chunk_token_overlap() -> usize {
    100
}

fn default_max_gleaning_steps() -> usize {
    1
}

/// Text splitting configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Separators, in priority order
    #[serde(default = "default_separators")]
    pub separators: Vec<String>,

    /// Target chunk size in tokens
    #[serde(default = "default_chunk_token_size")]
    pub chunk_token_size: usize,

    /// Overlap between consecutive chunks in tokens
    #[serde(default = "default_chunk_token_overlap")]
    pub chunk_token_overlap: usize,
}

impl ChunkingConfig {
    /// Target chunk size in characters
    pub fn chunk_size(&self) -> usize {
        self.chunk_token_size * TOKEN_TO_CHAR_RATIO
    }

    /// Overlap size in characters
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_token_overlap * TOKEN_TO_CHAR_RATIO
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ExtractorError> {
        if self.chunk_token_size == 0 {
            return Err(ExtractorError::Config(
                "chunk_token_size must be greater than 0".to_string(),
            ));
        }
        if self.chunk_token_overlap >= self.chunk_token_size {
            return Err(ExtractorError::Config(
                "chunk_token_overlap must be smaller than chunk_token_size".to_string(),
            ));
        }
        if self.separators.iter().any(String::is_empty) {
            return Err(ExtractorError::Config(
                "separators must not contain empty strings".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            separators: default_separators(),
            chunk_token_size: default_chunk_token_size(),
            chunk_token_overlap: default_chunk_token_overlap(),
        }
    }
}

/// Configuration for the Extractor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Maximum gleaning rounds per chunk (0 disables gleaning)
    #[serde(default = "default_max_gleaning_steps")]
    pub max_gleaning_steps: usize,

    /// Maximum chunks extracted concurrently per document (unbounded if absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<usize>,

    /// Text splitting settings
    #[serde(default)]
    pub chunking: ChunkingConfig,
}

impl ExtractorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ExtractorError> {
        if self.max_concurrency == Some(0) {
            return Err(ExtractorError::Config(
                "max_concurrency must be greater than 0".to_string(),
            ));
        }
        self.chunking.validate()
    }

    /// Aggressive preset: no gleaning, smaller chunks, bounded concurrency
    pub fn aggressive() -> Self {
        Self {
            max_gleaning_steps: 0,
            max_concurrency: Some(4),
            chunking: ChunkingConfig {
                chunk_token_size: 600,
                chunk_token_overlap: 60,
                ..ChunkingConfig::default()
            },
        }
    }

    /// Lenient preset: more gleaning, larger chunks for better recall
    pub fn lenient() -> Self {
        Self {
            max_gleaning_steps: 3,
            max_concurrency: None,
            chunking: ChunkingConfig {
                chunk_token_size: 1200,
                chunk_token_overlap: 150,
                ..ChunkingConfig::default()
            },
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ExtractorError> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| ExtractorError::Config(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ExtractorError> {
        toml::to_string_pretty(self)
            .map_err(|e| ExtractorError::Config(format!("Failed to serialize to TOML: {}", e)))
    }
}

impl Default for ExtractorConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            max_gleaning_steps: default_max_gleaning_steps(),
            max_concurrency: None,
            chunking: ChunkingConfig::default(),
        }
    }
}
