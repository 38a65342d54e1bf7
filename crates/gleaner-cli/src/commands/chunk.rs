//! Chunk command implementation.

use super::{apply_chunk_overrides, load_documents, source_of};
use crate::cli::ChunkArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::{ChunkReport, ChunkView, Formatter};
use gleaner_extractor::ChunkingService;

/// Execute the chunk command.
pub fn execute_chunk(args: ChunkArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let mut settings = config.extractor.clone();
    apply_chunk_overrides(&mut settings, &args.input);

    let documents = load_documents(&args.input.files)?;
    let service = ChunkingService::new(&settings.chunking)?;

    let reports: Vec<ChunkReport> = documents
        .iter()
        .zip(service.extract(&documents))
        .map(|(document, chunks)| ChunkReport {
            source: source_of(document),
            chunks: chunks.iter().map(ChunkView::from).collect(),
        })
        .collect();

    println!("{}", formatter.format_chunks(&reports, args.pretty)?);
    Ok(())
}
