//! Input documents

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Open key-value metadata attached to a document and inherited by its chunks
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// A raw input document
///
/// Documents are immutable once created; the splitter works on a sanitized copy
/// of `data` and never mutates the original.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document text
    pub data: String,

    /// Caller-supplied metadata
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    /// Create a document without metadata
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            metadata: Metadata::new(),
        }
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
