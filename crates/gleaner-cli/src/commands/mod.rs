//! Command implementations.

mod chunk;
mod extract;
mod init;

pub use chunk::execute_chunk;
pub use extract::execute_extract;
pub use init::execute_init;

use crate::cli::InputArgs;
use crate::error::{CliError, Result};
use gleaner_domain::Document;
use gleaner_extractor::ExtractorConfig;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// Metadata key recording which input a document came from.
pub const SOURCE_KEY: &str = "source";

/// Read every input into a document, tagging it with its source.
pub(crate) fn load_documents(files: &[impl AsRef<Path>]) -> Result<Vec<Document>> {
    let mut stdin_used = false;
    let mut documents = Vec::with_capacity(files.len());

    for file in files {
        let path = file.as_ref();
        let (source, data) = if path == Path::new("-") {
            if stdin_used {
                return Err(CliError::InvalidInput(
                    "standard input can only be read once".to_string(),
                ));
            }
            stdin_used = true;
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            ("<stdin>".to_string(), buffer)
        } else {
            let data = fs::read_to_string(path).map_err(|e| {
                CliError::InvalidInput(format!("Cannot read {}: {}", path.display(), e))
            })?;
            (path.display().to_string(), data)
        };

        documents.push(Document::new(data).with_metadata(SOURCE_KEY, source));
    }

    Ok(documents)
}

/// Source name recorded on a document.
pub(crate) fn source_of(document: &Document) -> String {
    document
        .metadata
        .get(SOURCE_KEY)
        .and_then(|value| value.as_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Apply command-line chunk size overrides to the extractor settings.
pub(crate) fn apply_chunk_overrides(config: &mut ExtractorConfig, input: &InputArgs) {
    if let Some(tokens) = input.chunk_tokens {
        config.chunking.chunk_token_size = tokens;
    }
    if let Some(tokens) = input.overlap_tokens {
        config.chunking.chunk_token_overlap = tokens;
    }
}
