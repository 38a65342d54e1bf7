//! Gleaner Extractor
//!
//! Builds knowledge graphs from raw documents using an LLM.
//!
//! # Overview
//!
//! Documents are split into bounded, overlapping chunks. Each chunk is sent to
//! the model for entity and relationship extraction, followed by optional
//! gleaning rounds that ask the model for anything it missed. Per-chunk graphs
//! are merged into one graph per document.
//!
//! # Architecture
//!
//! ```text
//! Documents → TextSplitter → Chunks → ExtractionWorker (× chunks) → GraphMerger → Graph
//! ```
//!
//! # Key Features
//!
//! - **Separator-aware splitting**: Chunks end on paragraph or sentence boundaries
//! - **Content-addressed chunks**: Duplicate chunks are extracted once
//! - **Gleaning**: Re-query the model for missed entities
//! - **Provenance Tracking**: Every relationship records the chunks that produced it
//! - **Fail-fast documents**: One failing chunk fails its document
//!
//! # Example Usage
//!
//! ```no_run
//! use gleaner_extractor::{Extractor, ExtractorConfig};
//! use gleaner_domain::{Document, PromptArgs};
//! use gleaner_llm::OllamaProvider;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let model = OllamaProvider::default_endpoint("llama3");
//! let extractor = Extractor::new(model, ExtractorConfig::default())?;
//!
//! let documents = vec![Document::new("Marley was dead: to begin with.")];
//! let args = PromptArgs::new()
//!     .with("domain", "Victorian fiction")
//!     .with_list("example_queries", ["Who is Scrooge?"]);
//!
//! let cancel = CancellationToken::new();
//! for handle in extractor.extract(&documents, &args, &["Character", "Place"], &cancel) {
//!     let document = handle.wait().await?;
//!     println!("Entities: {}", document.graph.entities.len());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod chunking;
mod config;
mod dedup;
mod error;
mod extractor;
mod merge;
mod normalize;
mod orchestrator;
mod prompt;
mod types;
mod worker;


pub use chunking::{sanitize, ChunkingService, TextSplitter};
pub use config::{ChunkingConfig, ExtractorConfig, DEFAULT_SEPARATORS, TOKEN_TO_CHAR_RATIO};
pub use dedup::deduplicate_chunks;
pub use error::ExtractorError;
pub use extractor::Extractor;
pub use merge::{EntityKey, GraphMerger, RelationKey};
pub use normalize::{normalize_entity_type, EntityTypeSet};
pub use orchestrator::{DocumentExtraction, ExtractionOrchestrator};
pub use prompt::{
    render_template, TemplateRenderer, CONTINUE_TEMPLATE, DOMAIN_ARG, ENTITY_TYPES_ARG,
    EXAMPLE_ARG, EXAMPLE_QUERIES_ARG, EXTRACTION_EXAMPLE, EXTRACTION_TEMPLATE,
    GLEANING_DONE_TEMPLATE, INPUT_TEXT_ARG,
};
pub use types::{ChunkExtraction, DocumentGraph, ExtractionMetadata};
pub use worker::ExtractionWorker;
