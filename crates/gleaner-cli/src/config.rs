//! Configuration management for the CLI.
//!
//! The configuration file is TOML with three optional sections:
//!
//! ```toml
//! [prompt]
//! domain = "A Christmas Carol"
//! example_queries = ["Who visits Scrooge?"]
//! entity_types = ["Character", "Place"]
//!
//! [ollama]
//! model = "llama3"
//!
//! [extractor]
//! max_gleaning_steps = 1
//!
//! [extractor.chunking]
//! chunk_token_size = 800
//! ```

use crate::error::{CliError, Result};
use gleaner_extractor::ExtractorConfig;
use gleaner_llm::OllamaConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "gleaner.toml";

/// Entity types used when neither the config nor the command line names any.
pub const DEFAULT_ENTITY_TYPES: &[&str] =
    &["Character", "Animal", "Place", "Object", "Activity", "Event"];

/// CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Prompt defaults
    #[serde(default)]
    pub prompt: PromptSettings,

    /// Model connection
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Chunking and extraction settings
    #[serde(default)]
    pub extractor: ExtractorConfig,
}

/// Default prompt arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptSettings {
    /// Description of the domain the documents belong to
    #[serde(default = "default_domain")]
    pub domain: String,

    /// Questions the graph should help answer
    #[serde(default)]
    pub example_queries: Vec<String>,

    /// Allowed entity types
    #[serde(default = "default_entity_types")]
    pub entity_types: Vec<String>,
}

fn default_domain() -> String {
    "General knowledge".to_string()
}

fn default_entity_types() -> Vec<String> {
    DEFAULT_ENTITY_TYPES.iter().map(|s| s.to_string()).collect()
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            example_queries: Vec::new(),
            entity_types: default_entity_types(),
        }
    }
}

impl Config {
    /// Per-user configuration file path.
    pub fn user_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("gleaner").join(CONFIG_FILE_NAME))
    }

    /// Pick the configuration file: an explicit path, then `./gleaner.toml`,
    /// then the per-user file.
    pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }

        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }

        Self::user_path().filter(|path| path.exists())
    }

    /// Load configuration, falling back to defaults when no file is found.
    ///
    /// An explicitly named file must exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match Self::resolve_path(explicit) {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Save configuration to file, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.ollama.model.trim().is_empty() {
            return Err(CliError::Config("ollama.model must not be empty".to_string()));
        }
        self.extractor.validate()?;
        Ok(())
    }
}
