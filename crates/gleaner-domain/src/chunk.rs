//! Chunk module - the unit of text handed to a single extraction worker

use crate::document::Metadata;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Content-addressed identifier for a chunk
///
/// The id is the first 8 bytes (big endian) of the SHA-256 digest of the chunk
/// content, so identical text always maps to the same id. Collisions of the
/// 64-bit prefix are accepted, not corrected for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkId(u64);

impl ChunkId {
    /// Derive the id of a piece of content
    ///
    /// # Examples
    ///
    /// ```
    /// use gleaner_domain::ChunkId;
    ///
    /// let a = ChunkId::from_content("Marley was dead.");
    /// let b = ChunkId::from_content("Marley was dead.");
    /// assert_eq!(a, b);
    /// ```
    pub fn from_content(content: &str) -> Self {
        let digest = Sha256::digest(content.as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        Self(u64::from_be_bytes(prefix))
    }

    /// Create a ChunkId from a raw value
    ///
    /// This is primarily for deserialization and tests.
    pub fn from_value(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw u64 value
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// A bounded unit of document text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Hash of `content`
    pub id: ChunkId,

    /// Chunk text, including any overlap prefix
    pub content: String,

    /// Metadata inherited from the source document
    #[serde(default)]
    pub metadata: Metadata,
}

impl Chunk {
    /// Create a chunk, deriving its id from the content
    pub fn new(content: impl Into<String>, metadata: Metadata) -> Self {
        let content = content.into();
        Self {
            id: ChunkId::from_content(&content),
            content,
            metadata,
        }
    }
}
