//! Separator-aware text splitting and per-document chunking

use crate::config::ChunkingConfig;
use crate::dedup::deduplicate_chunks;
use crate::error::ExtractorError;
use gleaner_domain::{Chunk, Document};
use regex::Regex;
use tracing::debug;

/// One element of a split text: either a run between separators or the
/// separator itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Piece<'t> {
    Segment(&'t str),
    Separator(&'t str),
}

impl<'t> Piece<'t> {
    fn text(&self) -> &'t str {
        match self {
            Piece::Segment(s) | Piece::Separator(s) => s,
        }
    }
}

/// Splits text into bounded, overlapping chunks along separator boundaries
///
/// All sizes are measured in characters. A segment is never cut in the middle,
/// so a single segment longer than the chunk size becomes an oversized chunk.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    separators: Option<Regex>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    /// Create a splitter from separators in priority order and sizes in characters
    pub fn new(
        separators: &[String],
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Result<Self, ExtractorError> {
        if chunk_size == 0 {
            return Err(ExtractorError::Config(
                "chunk size must be greater than 0".to_string(),
            ));
        }

        let alternatives: Vec<String> = separators
            .iter()
            .filter(|s| !s.is_empty())
            .map(|s| regex::escape(s))
            .collect();

        // Alternation is leftmost-first, so earlier separators win ties
        let separators = if alternatives.is_empty() {
            None
        } else {
            let pattern = alternatives.join("|");
            Some(Regex::new(&pattern).map_err(|e| {
                ExtractorError::Config(format!("Invalid separator pattern: {}", e))
            })?)
        };

        Ok(Self {
            separators,
            chunk_size,
            chunk_overlap,
        })
    }

    /// Create a splitter from token-based configuration
    pub fn from_config(config: &ChunkingConfig) -> Result<Self, ExtractorError> {
        config.validate()?;
        Self::new(&config.separators, config.chunk_size(), config.chunk_overlap())
    }

    /// Split `text` into chunks
    ///
    /// Control characters are stripped first. Text that fits within the chunk
    /// size is returned as a single chunk; empty text yields no chunks. Each
    /// chunk after the first is prefixed with the longest run of trailing
    /// pieces of the previous chunk that fits within the overlap size. The
    /// size bound applies to the chunk before that prefix is added.
    pub fn split(&self, text: &str) -> Vec<String> {
        let text = sanitize(text);
        if text.is_empty() {
            return Vec::new();
        }
        if char_len(&text) <= self.chunk_size {
            return vec![text];
        }

        let groups = self.group(&text);
        let mut chunks = Vec::with_capacity(groups.len());
        for (index, group) in groups.iter().enumerate() {
            let body = group.concat();
            let mut chunk = String::new();
            if index > 0 {
                chunk.push_str(&overlap_prefix(&groups[index - 1], self.chunk_overlap));
            }
            chunk.push_str(&body);
            chunks.push(chunk);
        }

        debug!(chunks = chunks.len(), "Split text");
        chunks
    }

    /// Greedily pack pieces into groups of at most `chunk_size - chunk_overlap`
    /// characters, leaving room for the overlap prefix
    ///
    /// Separators always join the current group so a chunk ends on its
    /// separator rather than starting with it.
    fn group<'t>(&self, text: &'t str) -> Vec<Vec<&'t str>> {
        let budget = self.chunk_size.saturating_sub(self.chunk_overlap);
        let mut groups = Vec::new();
        let mut current: Vec<&'t str> = Vec::new();
        let mut current_len = 0;

        for piece in self.pieces(text) {
            let len = char_len(piece.text());
            let fits = matches!(piece, Piece::Separator(_)) || current_len + len <= budget;

            if fits || current.is_empty() {
                current.push(piece.text());
                current_len += len;
            } else {
                groups.push(std::mem::take(&mut current));
                current.push(piece.text());
                current_len = len;
            }
        }
        if !current.is_empty() {
            groups.push(current);
        }

        groups.retain(|group| group.iter().any(|p| !p.is_empty()));
        groups
    }

    /// Alternating segments and separators, always ending with an empty
    /// separator so every segment has a partner
    fn pieces<'t>(&self, text: &'t str) -> Vec<Piece<'t>> {
        let mut pieces = Vec::new();
        let mut last = 0;

        if let Some(separators) = &self.separators {
            for m in separators.find_iter(text) {
                pieces.push(Piece::Segment(&text[last..m.start()]));
                pieces.push(Piece::Separator(m.as_str()));
                last = m.end();
            }
        }
        pieces.push(Piece::Segment(&text[last..]));
        pieces.push(Piece::Separator(""));

        pieces
    }
}

/// Remove C0 and C1 control characters (including `\n` and `\r`)
pub fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(*c, '\u{0}'..='\u{1f}' | '\u{7f}'..='\u{9f}'))
        .collect()
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Longest run of trailing pieces from `previous` whose total length fits
/// within `overlap`
fn overlap_prefix(previous: &[&str], overlap: usize) -> String {
    let mut taken = 0;
    let mut start = previous.len();

    for (index, piece) in previous.iter().enumerate().rev() {
        let len = char_len(piece);
        if taken + len > overlap {
            break;
        }
        taken += len;
        start = index;
    }

    previous[start..].concat()
}

/// Turns documents into deduplicated chunk lists
#[derive(Debug, Clone)]
pub struct ChunkingService {
    splitter: TextSplitter,
}

impl ChunkingService {
    /// Create a chunking service
    pub fn new(config: &ChunkingConfig) -> Result<Self, ExtractorError> {
        Ok(Self {
            splitter: TextSplitter::from_config(config)?,
        })
    }

    /// Create a chunking service around an existing splitter
    pub fn with_splitter(splitter: TextSplitter) -> Self {
        Self { splitter }
    }

    /// Chunk one document; chunks inherit the document metadata
    pub fn chunk_document(&self, document: &Document) -> Vec<Chunk> {
        let chunks = self
            .splitter
            .split(&document.data)
            .into_iter()
            .map(|content| Chunk::new(content, document.metadata.clone()))
            .collect();
        deduplicate_chunks(chunks)
    }

    /// Chunk every document, preserving document order
    pub fn extract(&self, documents: &[Document]) -> Vec<Vec<Chunk>> {
        documents.iter().map(|doc| self.chunk_document(doc)).collect()
    }
}
