//! Error types for the CLI application.

use gleaner_extractor::ExtractorError;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Extraction setup or execution error
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractorError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Some documents could not be extracted
    #[error("{failed} of {total} document(s) failed")]
    DocumentsFailed {
        /// Failed documents
        failed: usize,
        /// All documents
        total: usize,
    },
}
